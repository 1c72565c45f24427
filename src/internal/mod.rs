//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod destruction;

pub(crate) use circular::{cycle_through, StackGuard};
pub(crate) use destruction::DestructionQueue;
