//! Container configuration.
//!
//! Settings come from defaults, a JSON document, or environment variables
//! with a common prefix (`SCOPED_DI_` unless another prefix is given).

use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};
use crate::scope::ScopeKind;

/// Default environment variable prefix.
pub const ENV_PREFIX: &str = "SCOPED_DI";

/// Settings applied when a [`ComponentCollection`](crate::ComponentCollection) is built.
///
/// # Examples
///
/// ```
/// use scoped_di::{ContainerConfig, ScopeKind};
///
/// let config = ContainerConfig::from_json_str(r#"{
///     "application_name": "payments",
///     "eager_singletons": false,
///     "scope_overrides": { "transaction": "prototype" }
/// }"#).unwrap();
///
/// assert_eq!(config.application_name, "payments");
/// assert!(!config.eager_singletons);
/// assert!(config.warn_on_undestroyed);
/// assert_eq!(config.scope_override("transaction"), Some(ScopeKind::Prototype));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Name exposed through [`ApplicationContext`](crate::ApplicationContext)
    pub application_name: String,
    /// Instantiate non-lazy singletons while building
    pub eager_singletons: bool,
    /// Log a warning when a registry is dropped without teardown
    pub warn_on_undestroyed: bool,
    /// Replaces the declared scope of the named definitions
    pub scope_overrides: BTreeMap<String, ScopeKind>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            application_name: "application".to_string(),
            eager_singletons: true,
            warn_on_undestroyed: true,
            scope_overrides: BTreeMap::new(),
        }
    }
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> DiResult<Self> {
        serde_json::from_str(json).map_err(|e| DiError::Config(format!("invalid JSON: {}", e)))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> DiResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DiError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Defaults overlaid with `SCOPED_DI_*` environment variables.
    pub fn from_env() -> DiResult<Self> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Defaults overlaid with `<PREFIX>_*` environment variables:
    ///
    /// - `<PREFIX>_APPLICATION_NAME`
    /// - `<PREFIX>_EAGER_SINGLETONS` (`true`/`false`/`1`/`0`/`yes`/`no`)
    /// - `<PREFIX>_WARN_ON_UNDESTROYED`
    /// - `<PREFIX>_SCOPES`, e.g. `transaction=prototype,tracker=request`
    pub fn from_env_with_prefix(prefix: &str) -> DiResult<Self> {
        let source = EnvironmentSource::with_prefix(prefix);
        let mut config = Self::default();

        if let Some(name) = source.get("application_name") {
            config.application_name = name;
        }
        if let Some(raw) = source.get("eager_singletons") {
            config.eager_singletons = parse_bool(&source.key("eager_singletons"), &raw)?;
        }
        if let Some(raw) = source.get("warn_on_undestroyed") {
            config.warn_on_undestroyed = parse_bool(&source.key("warn_on_undestroyed"), &raw)?;
        }
        if let Some(raw) = source.get("scopes") {
            for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                let (name, scope) = entry.split_once('=').ok_or_else(|| {
                    DiError::Config(format!(
                        "{}: expected name=scope, got '{}'",
                        source.key("scopes"),
                        entry
                    ))
                })?;
                config
                    .scope_overrides
                    .insert(name.trim().to_string(), scope.parse()?);
            }
        }
        Ok(config)
    }

    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    pub fn with_eager_singletons(mut self, eager: bool) -> Self {
        self.eager_singletons = eager;
        self
    }

    pub fn with_warn_on_undestroyed(mut self, warn: bool) -> Self {
        self.warn_on_undestroyed = warn;
        self
    }

    pub fn with_scope_override(mut self, name: impl Into<String>, scope: ScopeKind) -> Self {
        self.scope_overrides.insert(name.into(), scope);
        self
    }

    pub fn scope_override(&self, name: &str) -> Option<ScopeKind> {
        self.scope_overrides.get(name).copied()
    }
}

/// Environment variable lookups under a prefix.
#[derive(Debug)]
struct EnvironmentSource {
    prefix: String,
}

impl EnvironmentSource {
    fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_uppercase(),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}_{}", self.prefix, key.to_uppercase())
    }

    fn get(&self, key: &str) -> Option<String> {
        env::var(self.key(key)).ok()
    }
}

fn parse_bool(key: &str, raw: &str) -> DiResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(DiError::Config(format!(
            "{}: expected a boolean, got '{}'",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ContainerConfig::default();
        assert_eq!(config.application_name, "application");
        assert!(config.eager_singletons);
        assert!(config.warn_on_undestroyed);
        assert!(config.scope_overrides.is_empty());
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = ContainerConfig::from_json_str(r#"{ "eager_singletons": false }"#).unwrap();
        assert!(!config.eager_singletons);
        assert_eq!(config.application_name, "application");
    }

    #[test]
    fn json_rejects_unknown_scope() {
        let err = ContainerConfig::from_json_str(r#"{ "scope_overrides": { "a": "thread" } }"#)
            .unwrap_err();
        assert!(matches!(err, DiError::Config(_)));
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool("K", "Yes").unwrap());
        assert!(!parse_bool("K", "0").unwrap());
        assert!(parse_bool("K", "maybe").is_err());
    }

    #[test]
    fn builder_setters() {
        let config = ContainerConfig::new()
            .with_application_name("demo")
            .with_eager_singletons(false)
            .with_warn_on_undestroyed(false)
            .with_scope_override("tracker", ScopeKind::Session);
        assert_eq!(config.application_name, "demo");
        assert!(!config.eager_singletons);
        assert!(!config.warn_on_undestroyed);
        assert_eq!(config.scope_override("tracker"), Some(ScopeKind::Session));
        assert_eq!(config.scope_override("other"), None);
    }
}
