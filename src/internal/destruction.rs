//! Pending destruction obligations.

use crate::instance::ManagedInstance;

/// Instances the registry must destroy at teardown, in creation order.
///
/// Drained in reverse (LIFO), so an instance is destroyed before anything
/// created ahead of it, which it may depend on.
#[derive(Default)]
pub(crate) struct DestructionQueue {
    pending: Vec<ManagedInstance>,
}

impl DestructionQueue {
    pub(crate) fn push(&mut self, instance: ManagedInstance) {
        self.pending.push(instance);
    }

    /// Removes every pending instance, last created first.
    pub(crate) fn drain_reverse(&mut self) -> Vec<ManagedInstance> {
        let mut drained = std::mem::take(&mut self.pending);
        drained.reverse();
        drained
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
