//! Per-context instance storage.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, ReentrantMutex};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{DiError, DiResult};
use crate::instance::ManagedInstance;
use crate::scope::ScopeKind;

/// Identity of a request or session context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ContextId(Uuid);

impl ContextId {
    fn new() -> Self {
        ContextId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Instances bound to one request or session.
///
/// Creation runs under a reentrant lock supplied by the resolving registry,
/// so concurrent first accesses construct once and a factory may resolve
/// further components on the creating thread. Sharing that lock with
/// singleton creation keeps a single lock order across scopes.
pub(crate) struct ContextStore {
    id: ContextId,
    kind: ScopeKind,
    created_at: DateTime<Utc>,
    active: AtomicBool,
    instances: Mutex<HashMap<&'static str, ManagedInstance>>,
}

impl ContextStore {
    pub(crate) fn new(kind: ScopeKind) -> Self {
        Self {
            id: ContextId::new(),
            kind,
            created_at: Utc::now(),
            active: AtomicBool::new(true),
            instances: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn id(&self) -> ContextId {
        self.id
    }

    pub(crate) fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn len(&self) -> usize {
        self.instances.lock().len()
    }

    /// Returns the instance bound under `name`, creating and binding it on
    /// first access. The flag is true when this call created it.
    pub(crate) fn get_or_create<F>(
        &self,
        name: &'static str,
        creation: &ReentrantMutex<()>,
        create: F,
    ) -> DiResult<(ManagedInstance, bool)>
    where
        F: FnOnce() -> DiResult<ManagedInstance>,
    {
        self.ensure_active(name)?;
        if let Some(bound) = self.lookup(name) {
            return Ok((bound, false));
        }

        let _creation = creation.lock();
        self.ensure_active(name)?;
        if let Some(bound) = self.lookup(name) {
            return Ok((bound, false));
        }
        let instance = create()?;
        {
            // `end` flips the flag under the same lock
            let mut instances = self.instances.lock();
            if !self.is_active() {
                return Err(DiError::not_active(name, self.kind));
            }
            instances.insert(name, instance.clone());
        }
        tracing::debug!(
            component = name,
            scope = %self.kind,
            context = %self.id,
            instance = %instance.id(),
            "bound instance to context"
        );
        Ok((instance, true))
    }

    /// Deactivates the context and drops its bindings without running
    /// destruction callbacks. Returns how many instances were discarded.
    pub(crate) fn end(&self) -> usize {
        let discarded = {
            let mut instances = self.instances.lock();
            if !self.active.swap(false, Ordering::AcqRel) {
                return 0;
            }
            std::mem::take(&mut *instances)
        };
        tracing::debug!(
            scope = %self.kind,
            context = %self.id,
            discarded = discarded.len(),
            "context ended"
        );
        discarded.len()
    }

    fn lookup(&self, name: &str) -> Option<ManagedInstance> {
        self.instances.lock().get(name).cloned()
    }

    fn ensure_active(&self, name: &str) -> DiResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(DiError::not_active(name, self.kind))
        }
    }
}

impl fmt::Debug for ContextStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextStore")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("active", &self.is_active())
            .field("instances", &self.len())
            .finish()
    }
}
