//! Handles given to factories and lifecycle callbacks.
//!
//! [`ResolverContext`] is what a factory sees while its component is being
//! constructed, [`ApplicationContext`] is the coarse handle passed to
//! context-aware components, and [`ComponentProvider`] is a long-lived
//! factory-style handle for fetching fresh instances on demand.

use std::fmt;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};

use crate::error::DiResult;
use crate::execution::ExecutionContext;
use crate::instance::{Managed, ManagedInstance};
use crate::key::DefinitionKey;
use crate::provider::{Registry, RegistryInner};
use crate::proxy::ScopedProxy;
use crate::traits::{Resolver, ResolverCore};

/// Context passed to factory functions for resolving dependencies.
///
/// Resolution through it uses the execution context the outer resolution
/// was made in, so a request scoped factory sees the same request.
///
/// # Examples
///
/// ```
/// use scoped_di::{ComponentCollection, Resolver};
/// use std::sync::Arc;
///
/// struct AuditLogger;
/// struct PaymentService { audit: Arc<AuditLogger> }
///
/// let mut components = ComponentCollection::new();
/// let audit = components.add_singleton("auditLogger", |_| AuditLogger).unwrap();
/// let payments = components
///     .add_singleton("paymentService", move |r| PaymentService {
///         audit: r.get(&audit).expect("audit logger").into_arc(),
///     })
///     .unwrap();
///
/// let registry = components.build().unwrap();
/// let service = registry.get(&payments).unwrap();
/// assert!(Arc::ptr_eq(&service.audit, registry.get(&audit).unwrap().arc()));
/// ```
pub struct ResolverContext<'a> {
    registry: &'a Registry,
    context: Option<&'a ExecutionContext>,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(registry: &'a Registry, context: Option<&'a ExecutionContext>) -> Self {
        Self { registry, context }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Context of the resolution in progress, if one was given explicitly.
    pub fn execution_context(&self) -> Option<&'a ExecutionContext> {
        self.context
    }

    /// Forwarding handle for a context-resolved component.
    pub fn proxy<T: Send + Sync + 'static>(
        &self,
        key: &DefinitionKey<T>,
    ) -> DiResult<Arc<ScopedProxy<T>>> {
        self.registry.proxy(key)
    }

    /// Factory-style handle for fetching instances later.
    pub fn provider<T: Send + Sync + 'static>(&self, key: &DefinitionKey<T>) -> ComponentProvider<T> {
        self.registry.provider(key)
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_instance(&self, name: &str) -> DiResult<ManagedInstance> {
        self.registry.resolve_by_name(name, self.context)
    }

    fn resolve_instance_in(
        &self,
        name: &str,
        context: &ExecutionContext,
    ) -> DiResult<ManagedInstance> {
        self.registry.resolve_by_name(name, Some(context))
    }

    fn contains_component(&self, name: &str) -> bool {
        self.registry.contains_component(name)
    }
}

/// Application-wide handle passed to context-aware components.
///
/// Resolves like the registry and adds application metadata.
#[derive(Clone)]
pub struct ApplicationContext {
    registry: Registry,
}

impl ApplicationContext {
    pub(crate) fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn application_name(&self) -> &str {
        &self.registry.config().application_name
    }

    /// When the registry was built.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.registry.started_at()
    }
}

impl ResolverCore for ApplicationContext {
    fn resolve_instance(&self, name: &str) -> DiResult<ManagedInstance> {
        self.registry.resolve_instance(name)
    }

    fn resolve_instance_in(
        &self,
        name: &str,
        context: &ExecutionContext,
    ) -> DiResult<ManagedInstance> {
        self.registry.resolve_instance_in(name, context)
    }

    fn contains_component(&self, name: &str) -> bool {
        self.registry.contains_component(name)
    }
}

impl fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("application_name", &self.application_name())
            .field("started_at", &self.started_at())
            .finish()
    }
}

/// Factory-style handle: resolves its definition on every `get`.
///
/// The way for a long-lived component to obtain a fresh prototype per use
/// instead of keeping the one it was constructed with. Holds the registry
/// weakly, so storing it inside a singleton creates no reference cycle.
///
/// # Examples
///
/// ```
/// use scoped_di::{ComponentCollection, ComponentProvider, Resolver};
///
/// struct Transaction;
/// struct PaymentService { transactions: ComponentProvider<Transaction> }
///
/// let mut components = ComponentCollection::new();
/// let transaction = components.add_prototype("transaction", |_| Transaction).unwrap();
/// let payments = components
///     .add_singleton("paymentService", move |r| PaymentService {
///         transactions: r.provider(&transaction),
///     })
///     .unwrap();
///
/// let registry = components.build().unwrap();
/// let service = registry.get(&payments).unwrap();
/// let first = service.transactions.get().unwrap();
/// let second = service.transactions.get().unwrap();
/// assert_ne!(first.id(), second.id());
/// ```
pub struct ComponentProvider<T> {
    registry: Weak<RegistryInner>,
    key: DefinitionKey<T>,
}

impl<T: Send + Sync + 'static> ComponentProvider<T> {
    pub(crate) fn new(registry: Weak<RegistryInner>, key: DefinitionKey<T>) -> Self {
        Self { registry, key }
    }

    pub fn key(&self) -> DefinitionKey<T> {
        self.key
    }

    /// Resolves the definition using the ambient execution context.
    pub fn get(&self) -> DiResult<Managed<T>> {
        Registry::upgrade(&self.registry)?.get(&self.key)
    }

    /// Resolves the definition against an explicit execution context.
    pub fn get_in(&self, context: &ExecutionContext) -> DiResult<Managed<T>> {
        Registry::upgrade(&self.registry)?.get_in(&self.key, context)
    }
}

impl<T> Clone for ComponentProvider<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            key: self.key,
        }
    }
}

impl<T: 'static> fmt::Debug for ComponentProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentProvider")
            .field("key", &self.key)
            .finish()
    }
}
