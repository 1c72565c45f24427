//! Registry-wide instances: singletons and application scoped components.

use std::collections::HashMap;

use parking_lot::{Mutex, ReentrantMutex};

use crate::error::DiResult;
use crate::instance::ManagedInstance;
use crate::internal::cycle_through;

enum Slot {
    /// Under construction on the thread holding the creation lock; holds the
    /// early reference once the factory has returned.
    Creating(Option<ManagedInstance>),
    Ready(ManagedInstance),
}

/// One instance per definition for the registry's lifetime.
///
/// Creation is a critical section: a registry-wide reentrant lock is held
/// while a shared instance is constructed and initialized, so racing first
/// accesses construct once, and the creating thread can resolve further
/// shared components (or itself, through the early reference) without
/// deadlocking.
///
/// The same lock serializes creation in request and session stores and is
/// held by teardown, so it is always the outermost lock a resolving thread
/// waits on.
pub(crate) struct SharedInstances {
    creation: ReentrantMutex<()>,
    slots: Mutex<HashMap<&'static str, Slot>>,
}

impl SharedInstances {
    pub(crate) fn new() -> Self {
        Self {
            creation: ReentrantMutex::new(()),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the instance for `name`, running `create` on first access.
    ///
    /// `create` receives a callback that publishes the early reference; the
    /// flag is true when this call created the instance.
    pub(crate) fn get_or_create<F>(
        &self,
        name: &'static str,
        create: F,
    ) -> DiResult<(ManagedInstance, bool)>
    where
        F: FnOnce(&dyn Fn(&ManagedInstance)) -> DiResult<ManagedInstance>,
    {
        if let Some(Slot::Ready(instance)) = self.slots.lock().get(name) {
            return Ok((instance.clone(), false));
        }

        let _creation = self.creation.lock();
        {
            let slots = self.slots.lock();
            match slots.get(name) {
                Some(Slot::Ready(instance)) => return Ok((instance.clone(), false)),
                Some(Slot::Creating(Some(early))) => {
                    tracing::trace!(component = name, instance = %early.id(), "early reference");
                    return Ok((early.clone(), false));
                }
                Some(Slot::Creating(None)) => return Err(cycle_through(name)),
                None => {}
            }
        }

        self.slots.lock().insert(name, Slot::Creating(None));
        let mut pending = PendingSlot {
            table: self,
            name,
            armed: true,
        };

        let publish = |instance: &ManagedInstance| {
            self.slots
                .lock()
                .insert(name, Slot::Creating(Some(instance.clone())));
        };
        let instance = create(&publish)?;

        self.slots.lock().insert(name, Slot::Ready(instance.clone()));
        pending.armed = false;
        Ok((instance, true))
    }

    /// The registry-wide creation lock.
    pub(crate) fn creation_lock(&self) -> &ReentrantMutex<()> {
        &self.creation
    }

    /// Runs `f` while no shared or context bound instance is being created
    /// on another thread.
    pub(crate) fn exclusive<R>(&self, f: impl FnOnce() -> R) -> R {
        let _creation = self.creation.lock();
        f()
    }

    /// Number of fully created instances.
    pub(crate) fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    /// Drops every instance, returning how many were held.
    pub(crate) fn clear(&self) -> usize {
        let _creation = self.creation.lock();
        let mut slots = self.slots.lock();
        let held = slots.len();
        slots.clear();
        held
    }
}

/// Releases a slot whose creation failed or unwound, so a later resolution
/// can retry.
struct PendingSlot<'a> {
    table: &'a SharedInstances,
    name: &'static str,
    armed: bool,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.table.slots.lock().remove(self.name);
        }
    }
}
