//! The scope registry: resolution, forwarding handles and teardown.

mod context;
mod lifecycle;
mod shared;

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::config::ContainerConfig;
use crate::definition::ComponentDefinition;
use crate::descriptors::ComponentDescriptor;
use crate::error::{DiError, DiResult};
use crate::execution::ExecutionContext;
use crate::instance::{AnyArc, InstanceId, ManagedInstance};
use crate::internal::DestructionQueue;
use crate::key::DefinitionKey;
use crate::observer::{Observers, ResolutionEvent};
use crate::proxy::ScopedProxy;
use crate::scope::ScopeKind;
use crate::traits::{PostProcessor, ResolverCore};

pub use context::{ApplicationContext, ComponentProvider, ResolverContext};
use shared::SharedInstances;

/// Registry of component definitions and the instances their scopes hold.
///
/// Built by [`ComponentCollection::build`](crate::ComponentCollection::build),
/// which also runs initialization (eager singletons). Call
/// [`teardown`](Registry::teardown) at shutdown to run singleton destruction
/// callbacks. Cheap to clone; clones share the same registry.
///
/// # Examples
///
/// ```
/// use scoped_di::{ComponentCollection, Resolver};
///
/// struct Bean;
///
/// let mut components = ComponentCollection::new();
/// let singleton = components.add_singleton("singletonBean", |_| Bean).unwrap();
/// let prototype = components.add_prototype("prototypeBean", |_| Bean).unwrap();
/// let registry = components.build().unwrap();
///
/// let s1 = registry.get(&singleton).unwrap();
/// let s2 = registry.get(&singleton).unwrap();
/// assert_eq!(s1.id(), s2.id());
///
/// let p1 = registry.get(&prototype).unwrap();
/// let p2 = registry.get(&prototype).unwrap();
/// assert_ne!(p1.id(), p2.id());
///
/// let report = registry.teardown();
/// assert_eq!(report.destroyed, vec![s1.id()]);
/// assert!(!p1.instance().is_destroyed());
/// ```
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

pub(crate) struct RegistryInner {
    definitions: HashMap<&'static str, ComponentDefinition>,
    order: Vec<&'static str>,
    shared: SharedInstances,
    destruction: Mutex<DestructionQueue>,
    proxies: HashMap<&'static str, AnyArc>,
    post_processors: Vec<Arc<dyn PostProcessor>>,
    observers: Observers,
    config: ContainerConfig,
    started_at: DateTime<Utc>,
    closed: AtomicBool,
}

/// Outcome of [`Registry::teardown`].
#[derive(Debug, Default)]
pub struct TeardownReport {
    /// Singletons whose destruction sequence ran, in destruction order
    pub destroyed: Vec<InstanceId>,
    /// Failures raised by destruction callbacks
    pub failures: Vec<DiError>,
    /// Shared instances dropped from the registry, including application scoped ones
    pub discarded: usize,
}

impl TeardownReport {
    pub fn destroyed_count(&self) -> usize {
        self.destroyed.len()
    }

    /// True when every destruction callback succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Registry {
    pub(crate) fn new(
        definitions: Vec<ComponentDefinition>,
        mut post_processors: Vec<Arc<dyn PostProcessor>>,
        observers: Observers,
        config: ContainerConfig,
    ) -> Self {
        post_processors.sort_by_key(|processor| processor.order());

        let inner = Arc::new_cyclic(|weak: &Weak<RegistryInner>| {
            let mut by_name = HashMap::with_capacity(definitions.len());
            let mut order = Vec::with_capacity(definitions.len());
            let mut proxies = HashMap::new();

            for definition in definitions {
                if definition.scope.is_proxied() {
                    let proxy = (definition.make_proxy)(definition.name, definition.scope, weak.clone());
                    proxies.insert(definition.name, proxy);
                }
                order.push(definition.name);
                by_name.insert(definition.name, definition);
            }

            RegistryInner {
                definitions: by_name,
                order,
                shared: SharedInstances::new(),
                destruction: Mutex::new(DestructionQueue::default()),
                proxies,
                post_processors,
                observers,
                config,
                started_at: Utc::now(),
                closed: AtomicBool::new(false),
            }
        });

        Registry { inner }
    }

    pub(crate) fn upgrade(weak: &Weak<RegistryInner>) -> DiResult<Registry> {
        weak.upgrade()
            .map(|inner| Registry { inner })
            .ok_or(DiError::RegistryClosed)
    }

    pub(crate) fn downgrade(&self) -> Weak<RegistryInner> {
        Arc::downgrade(&self.inner)
    }

    /// Startup: instantiates every non-lazy singleton in registration order
    /// when eager singletons are enabled.
    pub(crate) fn init(&self) -> DiResult<()> {
        if !self.inner.config.eager_singletons {
            tracing::info!(
                components = self.inner.order.len(),
                "registry initialized, singletons deferred"
            );
            return Ok(());
        }

        let mut created = 0usize;
        for name in &self.inner.order {
            let definition = &self.inner.definitions[name];
            if definition.is_eager() {
                self.resolve_definition(definition, None)?;
                created += 1;
            }
        }
        tracing::info!(
            components = self.inner.order.len(),
            singletons = created,
            "registry initialized"
        );
        Ok(())
    }

    /// Shutdown: destroys every created singleton exactly once, last created
    /// first, and drops application scoped instances without callbacks.
    ///
    /// Failures are collected, not propagated, so one failing callback does
    /// not keep other singletons from being destroyed. Later calls return an
    /// empty report, and every resolution afterwards fails with
    /// [`DiError::RegistryClosed`].
    pub fn teardown(&self) -> TeardownReport {
        // Holding the creation lock waits out creations already in flight on
        // other threads, so every singleton they finish is queued before the
        // drain.
        let report = self.inner.shared.exclusive(|| {
            if self.inner.closed.swap(true, Ordering::AcqRel) {
                return None;
            }
            let pending = self.inner.destruction.lock().drain_reverse();
            let mut report = TeardownReport::default();
            for instance in pending {
                report.destroyed.push(instance.id());
                if let Err(error) = self.destroy_instance(&instance) {
                    report.failures.push(error);
                }
            }
            report.discarded = self.inner.shared.clear();
            Some(report)
        });
        let report = match report {
            Some(report) => report,
            None => return TeardownReport::default(),
        };

        tracing::info!(
            destroyed = report.destroyed.len(),
            failures = report.failures.len(),
            discarded = report.discarded,
            "registry torn down"
        );
        report
    }

    /// Runs destruction callbacks for a prototype instance.
    ///
    /// Fails with [`DiError::DoubleDestroy`] on a second call for the same
    /// instance and with [`DiError::ContainerManaged`] for instances of any
    /// other scope.
    pub fn destroy<I>(&self, instance: &I) -> DiResult<()>
    where
        I: AsRef<ManagedInstance> + ?Sized,
    {
        let instance = instance.as_ref();
        if instance.scope() != ScopeKind::Prototype {
            return Err(DiError::ContainerManaged {
                name: instance.name().to_string(),
                scope: instance.scope(),
            });
        }
        self.destroy_instance(instance)
    }

    fn destroy_instance(&self, instance: &ManagedInstance) -> DiResult<()> {
        if !instance.mark_destroyed() {
            return Err(DiError::DoubleDestroy {
                name: instance.name().to_string(),
                id: instance.id(),
            });
        }
        let definition = self.definition(instance.name())?;
        self.run_destruction(definition, instance)
    }

    /// The forwarding handle for a request, session or application scoped
    /// definition. Every call returns the same handle.
    pub fn proxy<T: Send + Sync + 'static>(
        &self,
        key: &DefinitionKey<T>,
    ) -> DiResult<Arc<ScopedProxy<T>>> {
        let definition = self.definition(key.name())?;
        let proxy = self
            .inner
            .proxies
            .get(key.name())
            .ok_or_else(|| DiError::ProxyUnavailable {
                name: definition.name.to_string(),
                scope: definition.scope,
            })?;
        proxy
            .clone()
            .downcast::<ScopedProxy<T>>()
            .map_err(|_| DiError::TypeMismatch {
                name: definition.name.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// A factory-style handle resolving `key` on every call.
    pub fn provider<T: Send + Sync + 'static>(&self, key: &DefinitionKey<T>) -> ComponentProvider<T> {
        ComponentProvider::new(self.downgrade(), *key)
    }

    pub fn application_context(&self) -> ApplicationContext {
        ApplicationContext::new(self.clone())
    }

    /// Descriptors of every definition, in registration order.
    pub fn descriptors(&self) -> Vec<ComponentDescriptor> {
        self.inner
            .order
            .iter()
            .map(|name| self.inner.definitions[name].descriptor())
            .collect()
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    /// False once torn down.
    pub fn is_running(&self) -> bool {
        !self.inner.closed.load(Ordering::Acquire)
    }

    /// Singleton and application scoped instances currently held.
    pub fn shared_instance_count(&self) -> usize {
        self.inner.shared.len()
    }

    /// Singletons that will be destroyed at teardown.
    pub fn pending_destruction_count(&self) -> usize {
        self.inner.destruction.lock().len()
    }

    pub(crate) fn resolve_by_name(
        &self,
        name: &str,
        context: Option<&ExecutionContext>,
    ) -> DiResult<ManagedInstance> {
        let definition = self.definition(name)?;
        self.resolve_definition(definition, context)
    }

    fn definition(&self, name: &str) -> DiResult<&ComponentDefinition> {
        self.inner
            .definitions
            .get(name)
            .ok_or_else(|| DiError::NotRegistered(name.to_string()))
    }

    fn resolve_definition(
        &self,
        definition: &ComponentDefinition,
        context: Option<&ExecutionContext>,
    ) -> DiResult<ManagedInstance> {
        let observers = &self.inner.observers;
        let observed = observers.has_observers();
        let start = Instant::now();
        if observed {
            observers.resolving(definition.name, definition.scope);
        }

        match self.resolve_in_scope(definition, context) {
            Ok((instance, created)) => {
                if !created {
                    tracing::trace!(
                        component = definition.name,
                        instance = %instance.id(),
                        "resolved cached instance"
                    );
                }
                if observed {
                    observers.resolved(&ResolutionEvent {
                        name: definition.name,
                        scope: definition.scope,
                        instance: instance.id(),
                        created,
                        duration: start.elapsed(),
                    });
                }
                Ok(instance)
            }
            Err(error) => {
                if observed {
                    observers.resolution_failed(definition.name, &error);
                }
                Err(error)
            }
        }
    }

    fn resolve_in_scope(
        &self,
        definition: &ComponentDefinition,
        context: Option<&ExecutionContext>,
    ) -> DiResult<(ManagedInstance, bool)> {
        if !self.is_running() {
            return Err(DiError::RegistryClosed);
        }

        match definition.scope {
            ScopeKind::Singleton | ScopeKind::Application => {
                self.inner.shared.get_or_create(definition.name, |publish| {
                    // Teardown may have started while this thread waited for
                    // the creation lock
                    if !self.is_running() {
                        return Err(DiError::RegistryClosed);
                    }
                    let instance = self.create_instance(definition, None, publish)?;
                    if definition.scope == ScopeKind::Singleton {
                        let mut queue = self.inner.destruction.lock();
                        if !self.is_running() {
                            // Torn down from inside this creation; the drain
                            // has already run
                            drop(queue);
                            let _ = self.destroy_instance(&instance);
                            return Err(DiError::RegistryClosed);
                        }
                        queue.push(instance.clone());
                    }
                    Ok(instance)
                })
            }
            ScopeKind::Prototype => {
                let instance = self.create_instance(definition, context, &|_| {})?;
                Ok((instance, true))
            }
            ScopeKind::Request | ScopeKind::Session => {
                let ambient;
                let context = match context {
                    Some(context) => context,
                    None => {
                        ambient = ExecutionContext::current()
                            .ok_or_else(|| DiError::not_active(definition.name, definition.scope))?;
                        &ambient
                    }
                };
                let store = context
                    .store_for(definition.scope)
                    .ok_or_else(|| DiError::not_active(definition.name, definition.scope))?;
                store.get_or_create(definition.name, self.inner.shared.creation_lock(), || {
                    if !self.is_running() {
                        return Err(DiError::RegistryClosed);
                    }
                    self.create_instance(definition, Some(context), &|_| {})
                })
            }
        }
    }
}

impl ResolverCore for Registry {
    fn resolve_instance(&self, name: &str) -> DiResult<ManagedInstance> {
        self.resolve_by_name(name, None)
    }

    fn resolve_instance_in(
        &self,
        name: &str,
        context: &ExecutionContext,
    ) -> DiResult<ManagedInstance> {
        self.resolve_by_name(name, Some(context))
    }

    fn contains_component(&self, name: &str) -> bool {
        self.inner.definitions.contains_key(name)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("components", &self.inner.order)
            .field("shared_instances", &self.shared_instance_count())
            .field("running", &self.is_running())
            .finish()
    }
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        if !self.config.warn_on_undestroyed || *self.closed.get_mut() {
            return;
        }
        let queue = self.destruction.get_mut();
        if !queue.is_empty() {
            tracing::warn!(
                pending = queue.len(),
                "registry dropped with singletons awaiting destruction; call teardown() before dropping"
            );
        }
    }
}
