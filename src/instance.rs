//! Managed instances and their identity tokens.

use std::any::{type_name, Any};
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{DiError, DiResult};
use crate::scope::ScopeKind;
use crate::traits::{Capabilities, Lifecycle};

pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Stable identity of a managed instance.
///
/// Assigned once at construction and never reused. Two handles refer to the
/// same instance exactly when their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub(crate) fn new() -> Self {
        InstanceId(Uuid::new_v4())
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Output of a definition's factory before it becomes a managed instance.
pub(crate) struct Constructed {
    pub(crate) value: AnyArc,
    pub(crate) lifecycle: Option<Arc<dyn Lifecycle>>,
}

struct InstanceInner {
    id: InstanceId,
    name: &'static str,
    scope: ScopeKind,
    created_at: DateTime<Utc>,
    value: AnyArc,
    lifecycle: Option<Arc<dyn Lifecycle>>,
    destroyed: AtomicBool,
}

/// A component instance together with its identity and lifecycle state.
///
/// Cloning a `ManagedInstance` clones the handle; every clone refers to the
/// same instance and shares its destroyed flag.
#[derive(Clone)]
pub struct ManagedInstance {
    inner: Arc<InstanceInner>,
}

impl ManagedInstance {
    pub(crate) fn new(name: &'static str, scope: ScopeKind, constructed: Constructed) -> Self {
        Self {
            inner: Arc::new(InstanceInner {
                id: InstanceId::new(),
                name,
                scope,
                created_at: Utc::now(),
                value: constructed.value,
                lifecycle: constructed.lifecycle,
                destroyed: AtomicBool::new(false),
            }),
        }
    }

    /// Identity token.
    pub fn id(&self) -> InstanceId {
        self.inner.id
    }

    /// Name of the definition that produced this instance.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Scope the instance was created for.
    pub fn scope(&self) -> ScopeKind {
        self.inner.scope
    }

    /// Construction timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// Whether destruction callbacks have run (or started running).
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    /// Returns true when the instance is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.inner.value.is::<T>()
    }

    /// Borrows the instance as a `T`, if it is one.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.value.downcast_ref::<T>()
    }

    /// Converts into a typed handle.
    pub fn downcast<T: Send + Sync + 'static>(self) -> DiResult<Managed<T>> {
        match self.inner.value.clone().downcast::<T>() {
            Ok(value) => Ok(Managed {
                instance: self,
                value,
            }),
            Err(_) => Err(DiError::TypeMismatch {
                name: self.inner.name.to_string(),
                expected: type_name::<T>(),
            }),
        }
    }

    /// Returns true when both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &ManagedInstance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn value(&self) -> &(dyn Any + Send + Sync) {
        &*self.inner.value
    }

    pub(crate) fn lifecycle(&self) -> Option<&Arc<dyn Lifecycle>> {
        self.inner.lifecycle.as_ref()
    }

    pub(crate) fn capabilities(&self) -> Capabilities {
        self.inner
            .lifecycle
            .as_ref()
            .map(|lifecycle| lifecycle.capabilities())
            .unwrap_or(Capabilities::NONE)
    }

    /// Flips the destroyed flag; false if it was already set.
    pub(crate) fn mark_destroyed(&self) -> bool {
        self.inner
            .destroyed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl fmt::Debug for ManagedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedInstance")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("scope", &self.inner.scope)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl AsRef<ManagedInstance> for ManagedInstance {
    fn as_ref(&self) -> &ManagedInstance {
        self
    }
}

/// Typed view of a [`ManagedInstance`].
///
/// Dereferences to the component. Obtained from [`Resolver::get`](crate::Resolver::get)
/// and friends.
pub struct Managed<T> {
    instance: ManagedInstance,
    value: Arc<T>,
}

impl<T> Managed<T> {
    /// Identity token.
    pub fn id(&self) -> InstanceId {
        self.instance.id()
    }

    /// Untyped handle with lifecycle state.
    pub fn instance(&self) -> &ManagedInstance {
        &self.instance
    }

    /// Shared pointer to the component.
    pub fn arc(&self) -> &Arc<T> {
        &self.value
    }

    /// Consumes the handle, returning the shared pointer.
    pub fn into_arc(self) -> Arc<T> {
        self.value
    }
}

impl<T> Clone for Managed<T> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
            value: self.value.clone(),
        }
    }
}

impl<T> Deref for Managed<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> AsRef<ManagedInstance> for Managed<T> {
    fn as_ref(&self) -> &ManagedInstance {
        &self.instance
    }
}

impl<T> fmt::Debug for Managed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Managed")
            .field("instance", &self.instance)
            .field("type", &type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(value: u32) -> ManagedInstance {
        ManagedInstance::new(
            "number",
            ScopeKind::Prototype,
            Constructed {
                value: Arc::new(value),
                lifecycle: None,
            },
        )
    }

    #[test]
    fn downcast_checks_type() {
        let instance = plain(7);
        assert!(instance.is::<u32>());
        assert_eq!(instance.downcast_ref::<u32>(), Some(&7));

        let typed = instance.clone().downcast::<u32>().unwrap();
        assert_eq!(*typed, 7);
        assert_eq!(typed.id(), instance.id());

        match instance.downcast::<String>() {
            Err(DiError::TypeMismatch { name, expected }) => {
                assert_eq!(name, "number");
                assert_eq!(expected, "alloc::string::String");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn id_serializes_as_plain_uuid() {
        let instance = plain(3);
        let json = serde_json::to_string(&instance.id()).unwrap();
        assert_eq!(json, format!("\"{}\"", instance.id()));
    }

    #[test]
    fn destroyed_flag_flips_once() {
        let instance = plain(1);
        let clone = instance.clone();
        assert!(!instance.is_destroyed());
        assert!(instance.mark_destroyed());
        assert!(!clone.mark_destroyed());
        assert!(clone.is_destroyed());
    }

    #[test]
    fn ids_are_unique() {
        let a = plain(1);
        let b = plain(1);
        assert_ne!(a.id(), b.id());
        assert!(!a.ptr_eq(&b));
        assert_eq!(a.capabilities(), Capabilities::NONE);
    }
}
