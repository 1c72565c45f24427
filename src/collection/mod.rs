//! Component collection: registration before the registry is built.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::ContainerConfig;
use crate::definition::{ComponentDefinition, DefinitionBuilder};
use crate::descriptors::ComponentDescriptor;
use crate::error::{DiError, DiResult};
use crate::key::DefinitionKey;
use crate::observer::{LifecycleObserver, Observers};
use crate::provider::{Registry, ResolverContext};
use crate::scope::ScopeKind;
use crate::traits::{Lifecycle, PostProcessor};

pub mod module_system;
pub use module_system::ComponentModule;

/// Definitions, post-processors and observers awaiting [`build`](ComponentCollection::build).
///
/// Every registration returns a typed [`DefinitionKey`] used to resolve the
/// component later. Names are unique across all scopes.
///
/// # Examples
///
/// ```
/// use scoped_di::{ComponentCollection, RequestContext, Resolver};
///
/// struct Settings { retries: u32 }
/// struct RequestTracker { retries: u32 }
///
/// let mut components = ComponentCollection::new();
/// let settings = components.add_singleton("settings", |_| Settings { retries: 3 }).unwrap();
/// let tracker = components
///     .add_request("requestTracker", move |r| RequestTracker {
///         retries: r.get(&settings).unwrap().retries,
///     })
///     .unwrap();
///
/// let registry = components.build().unwrap();
/// let request = RequestContext::new();
/// let _guard = request.enter();
/// assert_eq!(registry.get(&tracker).unwrap().retries, 3);
/// ```
pub struct ComponentCollection {
    definitions: Vec<ComponentDefinition>,
    names: HashSet<&'static str>,
    post_processors: Vec<Arc<dyn PostProcessor>>,
    observers: Observers,
    config: ContainerConfig,
}

impl ComponentCollection {
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            definitions: Vec::new(),
            names: HashSet::new(),
            post_processors: Vec::new(),
            observers: Observers::new(),
            config,
        }
    }

    /// One shared instance per registry, destroyed at teardown.
    pub fn add_singleton<T, F>(&mut self, name: &'static str, factory: F) -> DiResult<DefinitionKey<T>>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.register(ComponentDefinition::plain(name, ScopeKind::Singleton, factory))
    }

    /// A new instance on every resolution. The registry never destroys these;
    /// see [`Registry::destroy`](crate::Registry::destroy).
    pub fn add_prototype<T, F>(&mut self, name: &'static str, factory: F) -> DiResult<DefinitionKey<T>>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.register(ComponentDefinition::plain(name, ScopeKind::Prototype, factory))
    }

    /// One instance per [`RequestContext`](crate::RequestContext).
    pub fn add_request<T, F>(&mut self, name: &'static str, factory: F) -> DiResult<DefinitionKey<T>>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.register(ComponentDefinition::plain(name, ScopeKind::Request, factory))
    }

    /// One instance per [`SessionContext`](crate::SessionContext).
    pub fn add_session<T, F>(&mut self, name: &'static str, factory: F) -> DiResult<DefinitionKey<T>>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.register(ComponentDefinition::plain(name, ScopeKind::Session, factory))
    }

    /// One lazily created instance per registry, reached through a forwarding handle.
    pub fn add_application<T, F>(&mut self, name: &'static str, factory: F) -> DiResult<DefinitionKey<T>>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.register(ComponentDefinition::plain(name, ScopeKind::Application, factory))
    }

    /// Registers a component implementing [`Lifecycle`] in any scope.
    pub fn add_managed<T, F>(
        &mut self,
        name: &'static str,
        scope: ScopeKind,
        factory: F,
    ) -> DiResult<DefinitionKey<T>>
    where
        T: Lifecycle,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.register(ComponentDefinition::managed(name, scope, factory))
    }

    /// Registers a fully configured definition.
    ///
    /// Fails with [`DiError::DuplicateDefinition`] when the name is taken.
    pub fn register<T: Send + Sync + 'static>(
        &mut self,
        builder: DefinitionBuilder<T>,
    ) -> DiResult<DefinitionKey<T>> {
        let key = builder.key();
        let definition = builder.build();
        if !self.names.insert(definition.name) {
            return Err(DiError::DuplicateDefinition(definition.name.to_string()));
        }
        tracing::trace!(component = definition.name, scope = %definition.scope, "registered");
        self.definitions.push(definition);
        Ok(key)
    }

    /// Applies a module's registrations.
    pub fn add_module<M: ComponentModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register(self)?;
        Ok(self)
    }

    pub fn add_post_processor(&mut self, processor: Arc<dyn PostProcessor>) -> &mut Self {
        self.post_processors.push(processor);
        self
    }

    /// Adds an observer notified of resolutions and lifecycle phases.
    ///
    /// # Examples
    ///
    /// ```
    /// use scoped_di::{ComponentCollection, LifecyclePhase, RecordingObserver, Resolver};
    /// use std::sync::Arc;
    ///
    /// let recorder = Arc::new(RecordingObserver::new());
    /// let mut components = ComponentCollection::new();
    /// let answer = components.add_prototype("answer", |_| 42u32).unwrap();
    /// components.add_observer(recorder.clone());
    ///
    /// let registry = components.build().unwrap();
    /// registry.get(&answer).unwrap();
    /// registry.get(&answer).unwrap();
    /// assert_eq!(recorder.count("answer", LifecyclePhase::Constructed), 2);
    /// ```
    pub fn add_observer(&mut self, observer: Arc<dyn LifecycleObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Descriptors of the registered definitions, in registration order.
    ///
    /// # Examples
    ///
    /// ```
    /// use scoped_di::{ComponentCollection, ScopeKind};
    ///
    /// let mut components = ComponentCollection::new();
    /// components.add_singleton("clock", |_| 0u64).unwrap();
    /// components.add_session("cart", |_| Vec::<String>::new()).unwrap();
    ///
    /// let scopes: Vec<_> = components.descriptors().iter().map(|d| d.scope).collect();
    /// assert_eq!(scopes, vec![ScopeKind::Singleton, ScopeKind::Session]);
    /// ```
    pub fn descriptors(&self) -> Vec<ComponentDescriptor> {
        self.definitions.iter().map(ComponentDefinition::descriptor).collect()
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Builds the registry and runs initialization.
    ///
    /// Configured scope overrides are applied first. When instantiating an
    /// eager singleton fails, the singletons created so far are torn down and
    /// the error is returned.
    pub fn build(mut self) -> DiResult<Registry> {
        self.apply_scope_overrides();

        let registry = Registry::new(
            self.definitions,
            self.post_processors,
            self.observers,
            self.config,
        );
        if let Err(error) = registry.init() {
            tracing::warn!(error = %error, "initialization failed, tearing down");
            let report = registry.teardown();
            for failure in &report.failures {
                tracing::warn!(error = %failure, "destruction failed during aborted startup");
            }
            return Err(error);
        }
        Ok(registry)
    }

    fn apply_scope_overrides(&mut self) {
        for (name, scope) in &self.config.scope_overrides {
            match self.definitions.iter_mut().find(|d| d.name == name.as_str()) {
                Some(definition) if definition.scope != *scope => {
                    tracing::info!(
                        component = definition.name,
                        from = %definition.scope,
                        to = %scope,
                        "scope overridden by configuration"
                    );
                    definition.scope = *scope;
                }
                Some(_) => {}
                None => {
                    tracing::warn!(component = %name, "scope override names no registered component");
                }
            }
        }
    }
}

impl Default for ComponentCollection {
    fn default() -> Self {
        Self::new()
    }
}
