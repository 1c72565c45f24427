//! Component scope definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DiError;

/// Scopes controlling how many instances of a definition exist and who shares them
///
/// # Scope Characteristics
///
/// - **Singleton**: one instance per registry, destroyed at teardown
/// - **Prototype**: a fresh instance per resolution, owned by the caller
/// - **Request**: one instance per active [`RequestContext`](crate::RequestContext)
/// - **Session**: one instance per active [`SessionContext`](crate::SessionContext)
/// - **Application**: one instance per registry, created lazily, never destroyed by the registry
///
/// # Examples
///
/// ```rust
/// use scoped_di::{ComponentCollection, Resolver, ScopeKind};
///
/// struct Counter { start: u32 }
///
/// let mut components = ComponentCollection::new();
/// let shared = components.add_singleton("shared", |_| Counter { start: 1 }).unwrap();
/// let fresh = components.add_prototype("fresh", |_| Counter { start: 2 }).unwrap();
/// let registry = components.build().unwrap();
///
/// let a = registry.get(&shared).unwrap();
/// let b = registry.get(&shared).unwrap();
/// assert_eq!(a.id(), b.id());
///
/// let c = registry.get(&fresh).unwrap();
/// let d = registry.get(&fresh).unwrap();
/// assert_ne!(c.id(), d.id());
///
/// assert_eq!("session".parse::<ScopeKind>().unwrap(), ScopeKind::Session);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    /// Single instance per registry, cached until teardown
    ///
    /// Created once (eagerly at build time unless the definition is lazy) and
    /// shared by every caller on every thread. The only scope whose
    /// destruction callbacks the registry runs.
    Singleton,
    /// New instance per resolution, never cached
    ///
    /// The registry keeps no reference after handing the instance out. Callers
    /// that need destruction callbacks invoke [`Registry::destroy`](crate::Registry::destroy).
    Prototype,
    /// Single instance per request context
    Request,
    /// Single instance per session context, shared by the session's requests
    Session,
    /// Single instance per registry, created on first access
    Application,
}

impl ScopeKind {
    /// All scopes, in declaration order.
    pub const ALL: [ScopeKind; 5] = [
        ScopeKind::Singleton,
        ScopeKind::Prototype,
        ScopeKind::Request,
        ScopeKind::Session,
        ScopeKind::Application,
    ];

    /// Lowercase scope name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Singleton => "singleton",
            ScopeKind::Prototype => "prototype",
            ScopeKind::Request => "request",
            ScopeKind::Session => "session",
            ScopeKind::Application => "application",
        }
    }

    /// Returns true when resolution needs an active execution context.
    pub fn is_context_bound(&self) -> bool {
        matches!(self, ScopeKind::Request | ScopeKind::Session)
    }

    /// Returns true when the registry caches exactly one instance.
    pub fn is_shared(&self) -> bool {
        matches!(self, ScopeKind::Singleton | ScopeKind::Application)
    }

    /// Returns true when resolution goes through a forwarding handle.
    pub fn is_proxied(&self) -> bool {
        matches!(
            self,
            ScopeKind::Request | ScopeKind::Session | ScopeKind::Application
        )
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeKind {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ScopeKind::ALL
            .iter()
            .copied()
            .find(|scope| scope.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| DiError::UnknownScope(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Prototype".parse::<ScopeKind>().unwrap(), ScopeKind::Prototype);
        assert_eq!(" request ".parse::<ScopeKind>().unwrap(), ScopeKind::Request);
        assert!(matches!(
            "thread".parse::<ScopeKind>(),
            Err(DiError::UnknownScope(s)) if s == "thread"
        ));
    }

    #[test]
    fn classifies_scopes() {
        assert!(ScopeKind::Session.is_context_bound());
        assert!(!ScopeKind::Application.is_context_bound());
        assert!(ScopeKind::Application.is_shared());
        assert!(ScopeKind::Application.is_proxied());
        assert!(!ScopeKind::Prototype.is_proxied());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ScopeKind::Singleton).unwrap();
        assert_eq!(json, "\"singleton\"");
        let parsed: ScopeKind = serde_json::from_str("\"session\"").unwrap();
        assert_eq!(parsed, ScopeKind::Session);
    }
}
