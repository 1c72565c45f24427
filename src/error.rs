//! Error types for the scope registry.

use thiserror::Error;

use crate::instance::InstanceId;
use crate::scope::ScopeKind;
use crate::traits::LifecyclePhase;

/// Scope registry errors
///
/// Represents the failure conditions of component registration, resolution,
/// destruction and container configuration.
///
/// # Examples
///
/// ```rust
/// use scoped_di::{ComponentCollection, DiError, Resolver};
///
/// let registry = ComponentCollection::new().build().unwrap();
/// match registry.get_named::<String>("greeting") {
///     Err(DiError::NotRegistered(name)) => assert_eq!(name, "greeting"),
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use scoped_di::{DiError, ScopeKind};
///
/// let inactive = DiError::ScopeNotActive {
///     name: "requestTracker".to_string(),
///     scope: ScopeKind::Request,
/// };
/// assert_eq!(
///     inactive.to_string(),
///     "Scope 'request' is not active for component 'requestTracker'"
/// );
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// No definition is registered under the requested name
    #[error("Component not registered: {0}")]
    NotRegistered(String),

    /// A request or session scoped component was resolved without a live context
    #[error("Scope '{scope}' is not active for component '{name}'")]
    ScopeNotActive { name: String, scope: ScopeKind },

    /// Destruction callbacks were requested a second time for one instance
    #[error("Component '{name}' instance {id} has already been destroyed")]
    DoubleDestroy { name: String, id: InstanceId },

    /// Manual destruction was requested for an instance the container owns
    #[error("Component '{name}' is owned by the {scope} scope and cannot be destroyed manually")]
    ContainerManaged { name: String, scope: ScopeKind },

    /// The registered instance is not of the requested type
    #[error("Type mismatch for component '{name}': expected {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),

    /// Maximum resolution depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),

    /// Two definitions were registered under the same name
    #[error("Duplicate component definition: {0}")]
    DuplicateDefinition(String),

    /// A lifecycle callback, hook or post-processor reported an error
    #[error("Lifecycle phase {phase} failed for component '{name}': {message}")]
    CallbackFailed {
        name: String,
        phase: LifecyclePhase,
        message: String,
    },

    /// Forwarding handles only exist for context-resolved scopes
    #[error("No scoped proxy for component '{name}' with {scope} scope")]
    ProxyUnavailable { name: String, scope: ScopeKind },

    /// The registry was torn down
    #[error("Registry has been torn down")]
    RegistryClosed,

    /// A scope name could not be parsed
    #[error("Unknown scope: {0}")]
    UnknownScope(String),

    /// Invalid container configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DiError {
    pub(crate) fn not_active(name: &str, scope: ScopeKind) -> Self {
        DiError::ScopeNotActive {
            name: name.to_string(),
            scope,
        }
    }

    pub(crate) fn callback_failed(
        name: &str,
        phase: LifecyclePhase,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        DiError::CallbackFailed {
            name: name.to_string(),
            phase,
            message: source.to_string(),
        }
    }
}

/// Result type for registry operations
pub type DiResult<T> = Result<T, DiError>;
