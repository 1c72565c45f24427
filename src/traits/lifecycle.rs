//! Lifecycle callbacks and the fixed phase order they run in.

use std::fmt;
use std::ops::BitOr;

use crate::provider::{ApplicationContext, Registry};

/// Result returned by lifecycle callbacks and hooks.
pub type CallbackResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Set of optional lifecycle callbacks an instance supports.
///
/// The registry consults this set before each capability-guarded phase and
/// skips the phase when the capability is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    /// Receives its registered name.
    pub const NAME_AWARE: Capabilities = Capabilities(1);
    /// Receives the owning registry.
    pub const REGISTRY_AWARE: Capabilities = Capabilities(1 << 1);
    /// Receives the application context.
    pub const CONTEXT_AWARE: Capabilities = Capabilities(1 << 2);
    /// Runs a post-construction callback.
    pub const POST_CONSTRUCT: Capabilities = Capabilities(1 << 3);
    /// Validates once all properties are set.
    pub const INITIALIZING: Capabilities = Capabilities(1 << 4);
    /// Runs a callback before disposal.
    pub const PRE_DESTROY: Capabilities = Capabilities(1 << 5);
    /// Releases its resources on destruction.
    pub const DISPOSABLE: Capabilities = Capabilities(1 << 6);
    pub const ALL: Capabilities = Capabilities((1 << 7) - 1);

    /// Returns true when every capability in `other` is present.
    pub const fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 | other.0)
    }

    pub const fn without(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 & !other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        self.union(rhs)
    }
}

/// Points in an instance's life at which the registry invokes callbacks.
///
/// Initialization runs [`LifecyclePhase::INITIALIZATION`] in order right
/// after [`Constructed`](LifecyclePhase::Constructed); destruction runs
/// [`LifecyclePhase::DESTRUCTION`] in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecyclePhase {
    /// Factory produced the instance
    Constructed,
    /// [`Lifecycle::set_component_name`]
    NameAssigned,
    /// [`Lifecycle::set_registry`]
    RegistryAssigned,
    /// [`Lifecycle::set_application_context`]
    ContextAssigned,
    /// Post-processors, before init callbacks
    BeforeInitialization,
    /// [`Lifecycle::post_construct`]
    PostConstruct,
    /// [`Lifecycle::after_properties_set`]
    PropertiesSet,
    /// The definition's init hook
    CustomInit,
    /// Post-processors, after init callbacks
    AfterInitialization,
    /// [`Lifecycle::pre_destroy`]
    PreDestroy,
    /// [`Lifecycle::destroy`]
    Dispose,
    /// The definition's destroy hook
    CustomDestroy,
}

impl LifecyclePhase {
    pub const INITIALIZATION: [LifecyclePhase; 8] = [
        LifecyclePhase::NameAssigned,
        LifecyclePhase::RegistryAssigned,
        LifecyclePhase::ContextAssigned,
        LifecyclePhase::BeforeInitialization,
        LifecyclePhase::PostConstruct,
        LifecyclePhase::PropertiesSet,
        LifecyclePhase::CustomInit,
        LifecyclePhase::AfterInitialization,
    ];

    pub const DESTRUCTION: [LifecyclePhase; 3] = [
        LifecyclePhase::PreDestroy,
        LifecyclePhase::Dispose,
        LifecyclePhase::CustomDestroy,
    ];

    /// Capability an instance needs for this phase to run, if any.
    ///
    /// Phases without a capability are driven by the definition (hooks) or
    /// the registry (post-processors).
    pub fn capability(&self) -> Option<Capabilities> {
        match self {
            LifecyclePhase::NameAssigned => Some(Capabilities::NAME_AWARE),
            LifecyclePhase::RegistryAssigned => Some(Capabilities::REGISTRY_AWARE),
            LifecyclePhase::ContextAssigned => Some(Capabilities::CONTEXT_AWARE),
            LifecyclePhase::PostConstruct => Some(Capabilities::POST_CONSTRUCT),
            LifecyclePhase::PropertiesSet => Some(Capabilities::INITIALIZING),
            LifecyclePhase::PreDestroy => Some(Capabilities::PRE_DESTROY),
            LifecyclePhase::Dispose => Some(Capabilities::DISPOSABLE),
            _ => None,
        }
    }

    pub fn is_destruction(&self) -> bool {
        matches!(
            self,
            LifecyclePhase::PreDestroy | LifecyclePhase::Dispose | LifecyclePhase::CustomDestroy
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecyclePhase::Constructed => "constructed",
            LifecyclePhase::NameAssigned => "name-assigned",
            LifecyclePhase::RegistryAssigned => "registry-assigned",
            LifecyclePhase::ContextAssigned => "context-assigned",
            LifecyclePhase::BeforeInitialization => "before-initialization",
            LifecyclePhase::PostConstruct => "post-construct",
            LifecyclePhase::PropertiesSet => "properties-set",
            LifecyclePhase::CustomInit => "custom-init",
            LifecyclePhase::AfterInitialization => "after-initialization",
            LifecyclePhase::PreDestroy => "pre-destroy",
            LifecyclePhase::Dispose => "dispose",
            LifecyclePhase::CustomDestroy => "custom-destroy",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional lifecycle callbacks for managed components.
///
/// Every method has a no-op default, so implementors override only what
/// they need. Register implementors with
/// [`ComponentDefinition::managed`](crate::ComponentDefinition::managed) or
/// [`ComponentCollection::add_managed`](crate::ComponentCollection::add_managed).
/// Narrow [`capabilities`](Lifecycle::capabilities) to keep phases you do
/// not implement out of observer traces.
///
/// Callbacks take `&self` because instances are shared; use interior
/// mutability for state set during initialization.
///
/// # Examples
///
/// ```
/// use scoped_di::{CallbackResult, ComponentCollection, Lifecycle, Resolver, ScopeKind};
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// struct Connection {
///     name: Mutex<String>,
/// }
///
/// impl Lifecycle for Connection {
///     fn set_component_name(&self, name: &str) {
///         *self.name.lock().unwrap() = name.to_string();
///     }
///
///     fn destroy(&self) -> CallbackResult {
///         println!("closing {}", self.name.lock().unwrap());
///         Ok(())
///     }
/// }
///
/// let mut components = ComponentCollection::new();
/// let key = components
///     .add_managed("primaryConnection", ScopeKind::Singleton, |_| Connection::default())
///     .unwrap();
/// let registry = components.build().unwrap();
/// assert_eq!(*registry.get(&key).unwrap().name.lock().unwrap(), "primaryConnection");
///
/// let report = registry.teardown();
/// assert_eq!(report.destroyed_count(), 1);
/// ```
pub trait Lifecycle: Send + Sync + 'static {
    /// Callbacks this instance supports.
    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    /// Step 2: the definition name the instance was registered under.
    fn set_component_name(&self, _name: &str) {}

    /// Step 3: the owning registry, for looking up sibling components.
    fn set_registry(&self, _registry: &Registry) {}

    /// Step 4: the application-wide context.
    fn set_application_context(&self, _context: &ApplicationContext) {}

    /// Step 5: dependencies are present, the instance may prepare itself.
    fn post_construct(&self) -> CallbackResult {
        Ok(())
    }

    /// Step 6: validate configuration.
    fn after_properties_set(&self) -> CallbackResult {
        Ok(())
    }

    /// First destruction callback.
    fn pre_destroy(&self) -> CallbackResult {
        Ok(())
    }

    /// Second destruction callback, releases resources.
    fn destroy(&self) -> CallbackResult {
        Ok(())
    }
}
