//! Resolver traits for component resolution.

use crate::error::DiResult;
use crate::execution::ExecutionContext;
use crate::instance::{Managed, ManagedInstance};
use crate::key::DefinitionKey;

/// Core resolver trait for object-safe, name-based resolution.
///
/// Most callers use [`Resolver`] instead, which adds typed methods on top.
pub trait ResolverCore: Send + Sync {
    /// Resolves a definition by name.
    ///
    /// Request and session scoped definitions resolve against the execution
    /// context bound to this resolver, falling back to the ambient context.
    ///
    /// # Returns
    ///
    /// * `Ok(ManagedInstance)` - The instance the definition's scope selects
    /// * `Err(DiError)` - Not registered, scope not active, circular, callback failure...
    fn resolve_instance(&self, name: &str) -> DiResult<ManagedInstance>;

    /// Resolves a definition by name against an explicit execution context.
    fn resolve_instance_in(&self, name: &str, context: &ExecutionContext)
        -> DiResult<ManagedInstance>;

    /// Returns true when a definition with this name is registered.
    fn contains_component(&self, name: &str) -> bool;
}

/// Typed resolution built on [`ResolverCore`].
///
/// Implemented for every `ResolverCore`, including
/// [`Registry`](crate::Registry) and the [`ResolverContext`](crate::ResolverContext)
/// handed to factories.
///
/// # Examples
///
/// ```
/// use scoped_di::{ComponentCollection, Resolver};
///
/// struct Config { port: u16 }
/// struct Server { port: u16 }
///
/// let mut components = ComponentCollection::new();
/// let config = components.add_singleton("config", |_| Config { port: 8080 }).unwrap();
/// let server = components
///     .add_singleton("server", move |r| Server {
///         port: r.get(&config).map(|c| c.port).unwrap_or_default(),
///     })
///     .unwrap();
///
/// let registry = components.build().unwrap();
/// assert_eq!(registry.get(&server).unwrap().port, 8080);
/// assert_eq!(registry.get_named::<Config>("config").unwrap().port, 8080);
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves the definition behind a typed key.
    fn get<T: Send + Sync + 'static>(&self, key: &DefinitionKey<T>) -> DiResult<Managed<T>> {
        self.resolve_instance(key.name())?.downcast::<T>()
    }

    /// Resolves the definition behind a typed key against an explicit context.
    fn get_in<T: Send + Sync + 'static>(
        &self,
        key: &DefinitionKey<T>,
        context: &ExecutionContext,
    ) -> DiResult<Managed<T>> {
        self.resolve_instance_in(key.name(), context)?.downcast::<T>()
    }

    /// Resolves a definition by name, checking its type at runtime.
    fn get_named<T: Send + Sync + 'static>(&self, name: &str) -> DiResult<Managed<T>> {
        self.resolve_instance(name)?.downcast::<T>()
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
