//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};

pub(crate) const MAX_DEPTH: usize = 1024;

// Thread-local stack of definitions currently under construction
thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<&'static str>> = RefCell::new(Vec::new());
}

/// Marks a definition as under construction on this thread.
///
/// Entering a name already on the stack is a cycle; the guard pops the name
/// when dropped, including on unwind.
pub(crate) struct StackGuard {
    name: &'static str,
}

impl StackGuard {
    pub(crate) fn enter(name: &'static str) -> DiResult<Self> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            // Circular detection BEFORE pushing the new name
            if stack.iter().any(|&n| n == name) {
                return Err(cycle(&stack, name));
            }

            if stack.len() >= MAX_DEPTH {
                return Err(DiError::DepthExceeded(stack.len()));
            }

            stack.push(name);
            Ok(Self { name })
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(popped, Some(self.name));
        });
    }
}

/// Cycle error ending in `name`, with the current stack as its path.
pub(crate) fn cycle_through(name: &'static str) -> DiError {
    RESOLUTION_STACK.with(|stack| cycle(&stack.borrow(), name))
}

fn cycle(stack: &[&'static str], name: &'static str) -> DiError {
    let start = stack.iter().position(|&n| n == name).unwrap_or(0);
    let mut path: Vec<String> = stack[start..].iter().map(|n| n.to_string()).collect();
    path.push(name.to_string());
    DiError::Circular(path)
}
