//! Component definitions: factory, scope and per-definition hooks.

use std::any::{type_name, Any};
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use crate::descriptors::ComponentDescriptor;
use crate::error::DiResult;
use crate::instance::{AnyArc, Constructed};
use crate::key::DefinitionKey;
use crate::provider::{RegistryInner, ResolverContext};
use crate::proxy::ScopedProxy;
use crate::scope::ScopeKind;
use crate::traits::{CallbackResult, Lifecycle};

pub(crate) type Constructor =
    Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<Constructed> + Send + Sync>;

pub(crate) type Hook = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> CallbackResult + Send + Sync>;

pub(crate) type ProxyMaker = fn(&'static str, ScopeKind, Weak<RegistryInner>) -> AnyArc;

/// A registered component: name, scope, factory and optional hooks.
///
/// Built with [`ComponentDefinition::managed`] or [`ComponentDefinition::plain`]
/// and registered through [`ComponentCollection::register`](crate::ComponentCollection::register).
/// Immutable once the registry is built.
#[derive(Clone)]
pub struct ComponentDefinition {
    pub(crate) name: &'static str,
    pub(crate) scope: ScopeKind,
    pub(crate) type_name: &'static str,
    pub(crate) ctor: Constructor,
    pub(crate) init_hook: Option<Hook>,
    pub(crate) destroy_hook: Option<Hook>,
    pub(crate) lazy: bool,
    pub(crate) lifecycle_aware: bool,
    pub(crate) make_proxy: ProxyMaker,
}

impl ComponentDefinition {
    /// Starts a definition for a component that implements [`Lifecycle`].
    ///
    /// # Examples
    ///
    /// ```
    /// use scoped_di::{CallbackResult, ComponentCollection, ComponentDefinition, Lifecycle, ScopeKind};
    ///
    /// struct Cache;
    /// impl Lifecycle for Cache {}
    ///
    /// impl Cache {
    ///     fn warm_up(&self) -> CallbackResult { Ok(()) }
    ///     fn flush(&self) -> CallbackResult { Ok(()) }
    /// }
    ///
    /// let mut components = ComponentCollection::new();
    /// components
    ///     .register(
    ///         ComponentDefinition::managed("cache", ScopeKind::Singleton, |_| Cache)
    ///             .init_hook(Cache::warm_up)
    ///             .destroy_hook(Cache::flush),
    ///     )
    ///     .unwrap();
    /// ```
    pub fn managed<T, F>(name: &'static str, scope: ScopeKind, factory: F) -> DefinitionBuilder<T>
    where
        T: Lifecycle,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        let ctor = constructor(move |resolver| {
            let value = Arc::new(factory(resolver));
            let lifecycle: Arc<dyn Lifecycle> = value.clone();
            let value: AnyArc = value;
            Ok(Constructed {
                value,
                lifecycle: Some(lifecycle),
            })
        });
        DefinitionBuilder::new(name, scope, ctor, true)
    }

    /// Starts a definition for a component without lifecycle callbacks.
    ///
    /// Only the definition's own hooks and post-processors run for it.
    pub fn plain<T, F>(name: &'static str, scope: ScopeKind, factory: F) -> DefinitionBuilder<T>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        let ctor = constructor(move |resolver| {
            let value: AnyArc = Arc::new(factory(resolver));
            Ok(Constructed {
                value,
                lifecycle: None,
            })
        });
        DefinitionBuilder::new(name, scope, ctor, false)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Summary for introspection.
    pub fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor {
            name: self.name,
            scope: self.scope,
            type_name: self.type_name,
            lazy: self.lazy,
            lifecycle_aware: self.lifecycle_aware,
            has_init_hook: self.init_hook.is_some(),
            has_destroy_hook: self.destroy_hook.is_some(),
        }
    }

    /// Singletons are created during build unless marked lazy.
    pub(crate) fn is_eager(&self) -> bool {
        self.scope == ScopeKind::Singleton && !self.lazy
    }
}

impl std::fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("type_name", &self.type_name)
            .field("lazy", &self.lazy)
            .finish()
    }
}

/// Typed builder for a [`ComponentDefinition`].
pub struct DefinitionBuilder<T> {
    definition: ComponentDefinition,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> DefinitionBuilder<T> {
    fn new(name: &'static str, scope: ScopeKind, ctor: Constructor, lifecycle_aware: bool) -> Self {
        Self {
            definition: ComponentDefinition {
                name,
                scope,
                type_name: type_name::<T>(),
                ctor,
                init_hook: None,
                destroy_hook: None,
                lazy: false,
                lifecycle_aware,
                make_proxy: make_proxy::<T>,
            },
            _marker: PhantomData,
        }
    }

    /// Custom init hook, run after `after_properties_set`.
    pub fn init_hook<H>(mut self, hook: H) -> Self
    where
        H: Fn(&T) -> CallbackResult + Send + Sync + 'static,
    {
        self.definition.init_hook = Some(erase_hook(hook));
        self
    }

    /// Custom destroy hook, run after `destroy`.
    pub fn destroy_hook<H>(mut self, hook: H) -> Self
    where
        H: Fn(&T) -> CallbackResult + Send + Sync + 'static,
    {
        self.definition.destroy_hook = Some(erase_hook(hook));
        self
    }

    /// Defers singleton creation until first resolution.
    pub fn lazy(mut self) -> Self {
        self.definition.lazy = true;
        self
    }

    /// Typed key for the definition being built.
    pub fn key(&self) -> DefinitionKey<T> {
        DefinitionKey::new(self.definition.name)
    }

    pub fn build(self) -> ComponentDefinition {
        self.definition
    }
}

fn constructor<F>(ctor: F) -> Constructor
where
    F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<Constructed> + Send + Sync + 'static,
{
    Arc::new(ctor)
}

fn erase_hook<T, H>(hook: H) -> Hook
where
    T: Send + Sync + 'static,
    H: Fn(&T) -> CallbackResult + Send + Sync + 'static,
{
    Arc::new(move |value: &(dyn Any + Send + Sync)| -> CallbackResult {
        match value.downcast_ref::<T>() {
            Some(typed) => hook(typed),
            None => Err(format!("hook expects {}", type_name::<T>()).into()),
        }
    })
}

fn make_proxy<T: Send + Sync + 'static>(
    name: &'static str,
    scope: ScopeKind,
    registry: Weak<RegistryInner>,
) -> AnyArc {
    Arc::new(ScopedProxy::<T>::new(name, scope, registry))
}
