//! Forwarding handles for context-resolved components.
//!
//! A singleton-scoped component cannot hold a request scoped instance
//! directly: it would keep the first request's instance forever. It holds a
//! [`ScopedProxy`] instead. The proxy's own identity is fixed for the
//! registry's lifetime, and each call through it looks up the instance bound
//! to the caller's active context.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Weak;

use uuid::Uuid;

use crate::error::DiResult;
use crate::execution::ExecutionContext;
use crate::instance::Managed;
use crate::provider::{Registry, RegistryInner};
use crate::scope::ScopeKind;

/// Identity of a forwarding handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProxyId(Uuid);

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Stable stand-in for a request, session or application scoped component.
///
/// Obtained from [`Registry::proxy`] or [`ResolverContext::proxy`](crate::ResolverContext::proxy);
/// every call for the same definition returns the same proxy.
///
/// # Examples
///
/// ```
/// use scoped_di::{ComponentCollection, RequestContext};
///
/// struct RequestTracker { path: String }
///
/// let mut components = ComponentCollection::new();
/// let tracker = components
///     .add_request("requestTracker", |_| RequestTracker { path: "/transfer".into() })
///     .unwrap();
/// let registry = components.build().unwrap();
///
/// let proxy = registry.proxy(&tracker).unwrap();
/// assert_eq!(proxy.id(), registry.proxy(&tracker).unwrap().id());
///
/// let first = RequestContext::new();
/// let second = RequestContext::new();
/// let a = first.enter();
/// let in_first = proxy.get().unwrap();
/// drop(a);
/// let _b = second.enter();
/// let in_second = proxy.get().unwrap();
///
/// assert_ne!(in_first.id(), in_second.id());
/// assert_eq!(proxy.with(|t| t.path.clone()).unwrap(), "/transfer");
/// ```
pub struct ScopedProxy<T> {
    id: ProxyId,
    name: &'static str,
    scope: ScopeKind,
    registry: Weak<RegistryInner>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ScopedProxy<T> {
    pub(crate) fn new(name: &'static str, scope: ScopeKind, registry: Weak<RegistryInner>) -> Self {
        Self {
            id: ProxyId(Uuid::new_v4()),
            name,
            scope,
            registry,
            _marker: PhantomData,
        }
    }

    /// Identity of the proxy itself, not of any target instance.
    pub fn id(&self) -> ProxyId {
        self.id
    }

    /// Name of the target definition.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    /// Resolves the target for the ambient execution context.
    pub fn get(&self) -> DiResult<Managed<T>> {
        self.registry()?
            .resolve_by_name(self.name, None)?
            .downcast::<T>()
    }

    /// Resolves the target for an explicit execution context.
    pub fn get_in(&self, context: &ExecutionContext) -> DiResult<Managed<T>> {
        self.registry()?
            .resolve_by_name(self.name, Some(context))?
            .downcast::<T>()
    }

    /// Forwards one call to the target bound to the ambient context.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> DiResult<R> {
        let target = self.get()?;
        Ok(f(&target))
    }

    /// Forwards one call to the target bound to `context`.
    pub fn with_in<R>(&self, context: &ExecutionContext, f: impl FnOnce(&T) -> R) -> DiResult<R> {
        let target = self.get_in(context)?;
        Ok(f(&target))
    }

    fn registry(&self) -> DiResult<Registry> {
        Registry::upgrade(&self.registry)
    }
}

impl<T> fmt::Debug for ScopedProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedProxy")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("scope", &self.scope)
            .finish()
    }
}
