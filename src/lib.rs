//! # scoped-di
//!
//! A component registry that decides, per named definition, how many
//! instances exist and how long they live, and drives each instance through
//! a fixed sequence of lifecycle callbacks.
//!
//! ## Features
//!
//! - **Five scopes**: Singleton, Prototype, Request, Session and Application
//! - **Ordered lifecycle**: aware callbacks, post-processors, init and destroy
//!   callbacks in a fixed, observable order
//! - **Forwarding handles**: inject a request or session scoped component into
//!   a singleton and reach the instance of whichever context is current
//! - **Thread-safe**: at-most-once creation for shared and session instances
//! - **Explicit teardown**: singletons destroyed exactly once, last created first
//!
//! ## Quick Start
//!
//! ```rust
//! use scoped_di::{CallbackResult, ComponentCollection, Lifecycle, Resolver, ScopeKind};
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! #[derive(Default)]
//! struct NotificationService {
//!     ready: AtomicBool,
//! }
//!
//! impl Lifecycle for NotificationService {
//!     fn post_construct(&self) -> CallbackResult {
//!         self.ready.store(true, Ordering::SeqCst);
//!         Ok(())
//!     }
//! }
//!
//! let mut components = ComponentCollection::new();
//! let notifications = components
//!     .add_managed("notificationService", ScopeKind::Singleton, |_| {
//!         NotificationService::default()
//!     })
//!     .unwrap();
//!
//! let registry = components.build().unwrap();
//! let service = registry.get(&notifications).unwrap();
//! assert!(service.ready.load(Ordering::SeqCst));
//!
//! let report = registry.teardown();
//! assert_eq!(report.destroyed_count(), 1);
//! ```
//!
//! ## Scopes
//!
//! - **Singleton**: one instance per registry, destroyed at teardown
//! - **Prototype**: a new instance per resolution, never destroyed by the registry
//! - **Request**: one instance per [`RequestContext`]
//! - **Session**: one instance per [`SessionContext`], shared by its requests
//! - **Application**: one lazily created instance per registry, reached through a handle
//!
//! ## Request and Session Components
//!
//! ```rust
//! use scoped_di::{ComponentCollection, Resolver, SessionContext};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct Cart {
//!     items: AtomicUsize,
//! }
//!
//! let mut components = ComponentCollection::new();
//! let cart = components.add_session("cart", |_| Cart::default()).unwrap();
//! let registry = components.build().unwrap();
//! let handle = registry.proxy(&cart).unwrap();
//!
//! let session = SessionContext::new();
//! for _ in 0..2 {
//!     let request = session.new_request();
//!     let _guard = request.enter();
//!     handle.with(|cart| cart.items.fetch_add(1, Ordering::SeqCst)).unwrap();
//! }
//!
//! let _guard = session.enter();
//! assert_eq!(handle.get().unwrap().items.load(Ordering::SeqCst), 2);
//! ```

pub mod collection;
pub mod config;
pub mod definition;
pub mod descriptors;
pub mod error;
pub mod execution;
pub mod instance;
pub mod key;
pub mod observer;
pub mod provider;
pub mod proxy;
pub mod scope;
pub mod traits;

// Internal modules
mod internal;

// Re-export core types
pub use collection::{ComponentCollection, ComponentModule};
pub use config::{ContainerConfig, ENV_PREFIX};
pub use definition::{ComponentDefinition, DefinitionBuilder};
pub use descriptors::ComponentDescriptor;
pub use error::{DiError, DiResult};
pub use execution::{ContextGuard, ContextId, ExecutionContext, RequestContext, SessionContext};
pub use instance::{InstanceId, Managed, ManagedInstance};
pub use key::DefinitionKey;
pub use observer::{LifecycleEvent, LifecycleObserver, RecordingObserver, ResolutionEvent, TracingObserver};
pub use provider::{ApplicationContext, ComponentProvider, Registry, ResolverContext, TeardownReport};
pub use proxy::{ProxyId, ScopedProxy};
pub use scope::ScopeKind;
pub use traits::{
    CallbackResult, Capabilities, Lifecycle, LifecyclePhase, PostProcessor, Resolver, ResolverCore,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_singleton_resolution() {
        let mut components = ComponentCollection::new();
        let key = components.add_singleton("answer", |_| 42usize).unwrap();
        let registry = components.build().unwrap();

        let first = registry.get(&key).unwrap();
        let second = registry.get(&key).unwrap();
        assert_eq!(*first, 42);
        assert!(Arc::ptr_eq(first.arc(), second.arc()));
    }

    #[test]
    fn test_prototype_resolution() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();

        let mut components = ComponentCollection::new();
        let key = components
            .add_prototype("ticket", move |_| counter.fetch_add(1, Ordering::SeqCst))
            .unwrap();
        let registry = components.build().unwrap();

        assert_eq!(*registry.get(&key).unwrap(), 0);
        assert_eq!(*registry.get(&key).unwrap(), 1);
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_request_resolution() {
        let mut components = ComponentCollection::new();
        let key = components.add_request("tracker", |_| String::from("tracker")).unwrap();
        let registry = components.build().unwrap();

        let request = ExecutionContext::from(RequestContext::new());
        let a = registry.get_in(&key, &request).unwrap();
        let b = registry.get_in(&key, &request).unwrap();
        assert_eq!(a.id(), b.id());

        let other = ExecutionContext::from(RequestContext::new());
        assert_ne!(registry.get_in(&key, &other).unwrap().id(), a.id());
    }

    #[test]
    fn test_lookup_by_name() {
        let mut components = ComponentCollection::new();
        components.add_singleton("greeting", |_| String::from("hello")).unwrap();
        let registry = components.build().unwrap();

        assert_eq!(registry.get_named::<String>("greeting").unwrap().as_str(), "hello");
        assert!(matches!(
            registry.get_named::<u32>("greeting"),
            Err(DiError::TypeMismatch { .. })
        ));
        assert!(matches!(
            registry.get_named::<String>("missing"),
            Err(DiError::NotRegistered(_))
        ));
    }
}
