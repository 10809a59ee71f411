//! Configuration schema (pkgext.toml)

use crate::diagnostic::{Diagnostic, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How reported messages are filtered and escalated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePolicy {
    /// Treat every warning as an error
    #[serde(default)]
    pub warnings_as_errors: bool,

    /// Warning ids to drop. Errors are never suppressed.
    #[serde(default)]
    pub suppress_warnings: Vec<u32>,

    /// Severity overrides keyed by message name
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl MessagePolicy {
    /// Apply the policy to one diagnostic. `None` means it was suppressed.
    pub fn apply(&self, mut diagnostic: Diagnostic) -> Option<Diagnostic> {
        if let Some(severity) = self.overrides.get(&diagnostic.name) {
            diagnostic.severity = *severity;
        }

        if diagnostic.severity == Severity::Warning {
            if self.suppress_warnings.contains(&diagnostic.id) {
                return None;
            }
            if self.warnings_as_errors {
                diagnostic.severity = Severity::Error;
            }
        }

        Some(diagnostic)
    }

    /// Apply the policy to a batch, keeping order
    pub fn apply_all(&self, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        diagnostics.into_iter().filter_map(|d| self.apply(d)).collect()
    }

    /// Set severity override for a message
    pub fn set_override(&mut self, name: impl Into<String>, severity: Severity) {
        self.overrides.insert(name.into(), severity);
    }
}

/// Which extensions are loaded
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionSettings {
    /// Extension names to enable. Empty means all of them.
    #[serde(default)]
    pub enabled: Vec<String>,
}

impl ExtensionSettings {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.is_empty() || self.enabled.iter().any(|n| n == name)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Message filtering
    #[serde(default)]
    pub messages: MessagePolicy,

    /// Extension selection
    #[serde(default)]
    pub extensions: ExtensionSettings,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::MessageDef;
    use crate::Location;

    const WARN: MessageDef = MessageDef::warning(6404, "DuplicateRemoteAddress", "dup {0}");
    const ERR: MessageDef = MessageDef::error(6403, "NoExceptionSpecified", "none");

    fn warning() -> Diagnostic {
        WARN.at(&Location::new("a.wxs"), &["x"])
    }

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(!config.messages.warnings_as_errors);
        assert!(config.extensions.is_enabled("bal"));
    }

    #[test]
    fn warnings_as_errors() {
        let policy = MessagePolicy {
            warnings_as_errors: true,
            ..Default::default()
        };
        assert_eq!(policy.apply(warning()).unwrap().severity, Severity::Error);
    }

    #[test]
    fn suppression_only_affects_warnings() {
        let policy = MessagePolicy {
            suppress_warnings: vec![6404, 6403],
            ..Default::default()
        };
        assert!(policy.apply(warning()).is_none());
        assert!(policy.apply(ERR.at(&Location::new("a.wxs"), &[])).is_some());
    }

    #[test]
    fn severity_override() {
        let mut policy = MessagePolicy::default();
        policy.set_override("DuplicateRemoteAddress", Severity::Error);
        assert_eq!(policy.apply(warning()).unwrap().severity, Severity::Error);
    }

    #[test]
    fn enabled_extensions() {
        let config = Config::from_toml(
            r#"
            [messages]
            warnings_as_errors = true
            suppress_warnings = [90]

            [extensions]
            enabled = ["bal", "http"]
            "#,
        )
        .unwrap();

        assert!(config.messages.warnings_as_errors);
        assert_eq!(config.messages.suppress_warnings, vec![90]);
        assert!(config.extensions.is_enabled("http"));
        assert!(!config.extensions.is_enabled("firewall"));
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut config = Config::default();
        config.messages.suppress_warnings = vec![6704];
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.messages, parsed.messages);
    }
}
