//! Component descriptors for introspection and diagnostics.

use serde::Serialize;

use crate::scope::ScopeKind;

/// Component descriptor for introspection and diagnostics
///
/// Summarizes a registered definition without exposing its factory or hooks.
///
/// # Examples
///
/// ```rust
/// use scoped_di::{ComponentCollection, ScopeKind};
///
/// struct AuditLogger;
/// struct Transaction;
///
/// let mut components = ComponentCollection::new();
/// components.add_singleton("auditLogger", |_| AuditLogger).unwrap();
/// components.add_prototype("transaction", |_| Transaction).unwrap();
///
/// let descriptors = components.descriptors();
/// assert_eq!(descriptors.len(), 2);
/// assert_eq!(descriptors[0].name, "auditLogger");
/// assert_eq!(descriptors[1].scope, ScopeKind::Prototype);
/// assert!(descriptors[1].type_name.ends_with("Transaction"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentDescriptor {
    /// Registered name
    pub name: &'static str,
    /// Declared (or configuration-overridden) scope
    pub scope: ScopeKind,
    /// Component type name
    pub type_name: &'static str,
    /// Singleton creation deferred to first resolution
    pub lazy: bool,
    /// Component implements `Lifecycle`
    pub lifecycle_aware: bool,
    pub has_init_hook: bool,
    pub has_destroy_hook: bool,
}

impl ComponentDescriptor {
    /// Returns true when destruction callbacks can ever run for this component.
    pub fn has_destruction_callbacks(&self) -> bool {
        self.lifecycle_aware || self.has_destroy_hook
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_json() {
        let descriptor = ComponentDescriptor {
            name: "auditLogger",
            scope: ScopeKind::Session,
            type_name: "AuditLogger",
            lazy: false,
            lifecycle_aware: true,
            has_init_hook: false,
            has_destroy_hook: true,
        };
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["name"], "auditLogger");
        assert_eq!(json["scope"], serde_json::to_value(ScopeKind::Session).unwrap());
        assert_eq!(json["lifecycle_aware"], true);
        assert_eq!(json["has_init_hook"], false);
    }
}
