// Generator configuration

use crate::error::{ListenError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Prefix for environment overrides, e.g. `LISTEN_FAILURE_POLICY=isolate`.
pub const ENV_PREFIX: &str = "LISTEN_";

/// What a pass does when one interface fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the whole pass at the first error.
    #[default]
    Abort,
    /// Skip the failing interface, keep generating the others, report all
    /// failures at the end.
    Isolate,
}

impl FromStr for FailurePolicy {
    type Err = ListenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "isolate" => Ok(FailurePolicy::Isolate),
            other => Err(ListenError::Config(format!(
                "unknown failure policy `{}` (expected `abort` or `isolate`)",
                other
            ))),
        }
    }
}

/// Which occurrences `remove_listener` drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// The first occurrence only.
    #[default]
    First,
    /// Every occurrence.
    All,
}

impl FromStr for RemovalPolicy {
    type Err = ListenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(RemovalPolicy::First),
            "all" => Ok(RemovalPolicy::All),
            other => Err(ListenError::Config(format!(
                "unknown removal policy `{}` (expected `first` or `all`)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub failure_policy: FailurePolicy,
    pub removal_policy: RemovalPolicy,
    /// Derives applied to event records and the `Event` enum.
    pub event_derives: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Abort,
            removal_policy: RemovalPolicy::First,
            event_derives: vec!["Debug".to_string(), "Clone".to_string()],
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = policy;
        self
    }

    pub fn with_event_derives<I, S>(mut self, derives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_derives = derives.into_iter().map(Into::into).collect();
        self
    }

    /// Parse a `listen.toml` document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ListenError::Config(format!("TOML parse error: {}", e)))
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ListenError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by `LISTEN_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env()
    }

    /// Override fields from `LISTEN_FAILURE_POLICY`, `LISTEN_REMOVAL_POLICY`
    /// and `LISTEN_EVENT_DERIVES` (comma separated).
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(value) = var("FAILURE_POLICY") {
            self.failure_policy = value.parse()?;
        }
        if let Some(value) = var("REMOVAL_POLICY") {
            self.removal_policy = value.parse()?;
        }
        if let Some(value) = var("EVENT_DERIVES") {
            self.event_derives = parse_list(&value);
        }
        Ok(self)
    }
}

/// Split a comma separated list, dropping blanks.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_reference_behavior() {
        let config = GeneratorConfig::default();
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.removal_policy, RemovalPolicy::First);
        assert_eq!(config.event_derives, vec!["Debug", "Clone"]);
    }

    #[test]
    fn test_parse_toml() {
        let config = GeneratorConfig::from_toml_str(
            r#"
            failure_policy = "isolate"
            removal_policy = "all"
            event_derives = ["Debug", "Clone", "PartialEq"]
            "#,
        )
        .unwrap();

        assert_eq!(config.failure_policy, FailurePolicy::Isolate);
        assert_eq!(config.removal_policy, RemovalPolicy::All);
        assert_eq!(config.event_derives.len(), 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GeneratorConfig::from_toml_str(r#"removal_policy = "all""#).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.removal_policy, RemovalPolicy::All);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = GeneratorConfig::from_toml_str(r#"failure_policy = "sometimes""#).unwrap_err();
        assert!(matches!(err, ListenError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listen.toml");
        fs::write(&path, "failure_policy = \"isolate\"\n").unwrap();

        let config = GeneratorConfig::load(&path).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Isolate);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FAILURE_POLICY", "Isolate"),
            ("EVENT_DERIVES", "Debug, PartialEq,,"),
        ]
        .into_iter()
        .collect();

        let config = GeneratorConfig::default()
            .apply_vars(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.failure_policy, FailurePolicy::Isolate);
        assert_eq!(config.removal_policy, RemovalPolicy::First);
        assert_eq!(config.event_derives, vec!["Debug", "PartialEq"]);
    }

    #[test]
    fn test_bad_env_value_fails() {
        let result = GeneratorConfig::default()
            .apply_vars(|key| (key == "REMOVAL_POLICY").then(|| "some".to_string()));
        assert!(matches!(result, Err(ListenError::Config(_))));
    }
}
