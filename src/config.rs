//! Configuration types for Tundra

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Result, TundraError};

/// Default port of the local debug listener
pub const DEFAULT_DEBUG_PORT: u16 = 9091;

/// Custom comparison for one matching dimension
///
/// Called as `(recorded, live, default_matcher)`. `default_matcher` runs the
/// built-in comparison for the dimension and is only evaluated if called.
pub type DimensionMatcher =
    Arc<dyn Fn(Option<&str>, Option<&str>, &dyn Fn() -> bool) -> bool + Send + Sync>;

/// Serializable replay settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaySettings {
    /// Header names excluded from header comparison
    #[serde(default)]
    pub headers_to_omit: Vec<String>,
    /// Report matches and misses to the debug listener
    #[serde(default = "default_debugging_enabled")]
    pub debugging_enabled: bool,
    /// Port of the debug listener on localhost
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,
}

fn default_debugging_enabled() -> bool {
    true
}

fn default_debug_port() -> u16 {
    DEFAULT_DEBUG_PORT
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            headers_to_omit: Vec::new(),
            debugging_enabled: default_debugging_enabled(),
            debug_port: default_debug_port(),
        }
    }
}

impl ReplaySettings {
    /// Load settings from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let settings: Self = toml::from_str(&content)
            .map_err(|e| TundraError::ConfigError(format!("Failed to parse config: {e}")))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings
    ///
    /// # Errors
    ///
    /// Returns error if settings are invalid
    pub fn validate(&self) -> Result<()> {
        if self.debug_port == 0 {
            return Err(TundraError::ConfigError(
                "debug_port cannot be 0".to_string(),
            ));
        }

        for (i, name) in self.headers_to_omit.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(TundraError::ConfigError(format!(
                    "headers_to_omit[{i}]: header name cannot be empty"
                )));
            }
        }

        Ok(())
    }
}

/// Matching configuration for a replay
///
/// Unset dimension matchers fall back to the built-in comparison.
#[derive(Clone)]
pub struct MatchingConfig {
    /// Custom URL comparison
    pub url_matcher: Option<DimensionMatcher>,
    /// Custom method comparison
    pub method_matcher: Option<DimensionMatcher>,
    /// Custom body comparison
    pub body_matcher: Option<DimensionMatcher>,
    /// Custom header comparison (receives canonical header strings)
    pub headers_matcher: Option<DimensionMatcher>,
    /// Header names removed before any header comparison
    pub headers_to_omit: BTreeSet<String>,
    /// Report matches and misses to the debug listener
    pub debugging_enabled: bool,
    /// Port of the debug listener on localhost
    pub debug_port: u16,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self::from_settings(&ReplaySettings::default())
    }
}

impl fmt::Debug for MatchingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchingConfig")
            .field("url_matcher", &self.url_matcher.is_some())
            .field("method_matcher", &self.method_matcher.is_some())
            .field("body_matcher", &self.body_matcher.is_some())
            .field("headers_matcher", &self.headers_matcher.is_some())
            .field("headers_to_omit", &self.headers_to_omit)
            .field("debugging_enabled", &self.debugging_enabled)
            .field("debug_port", &self.debug_port)
            .finish()
    }
}

impl MatchingConfig {
    /// Build a config from serializable settings, with no custom matchers
    #[must_use]
    pub fn from_settings(settings: &ReplaySettings) -> Self {
        Self {
            url_matcher: None,
            method_matcher: None,
            body_matcher: None,
            headers_matcher: None,
            headers_to_omit: settings.headers_to_omit.iter().cloned().collect(),
            debugging_enabled: settings.debugging_enabled,
            debug_port: settings.debug_port,
        }
    }

    /// Override URL comparison
    #[must_use]
    pub fn with_url_matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(Option<&str>, Option<&str>, &dyn Fn() -> bool) -> bool + Send + Sync + 'static,
    {
        self.url_matcher = Some(Arc::new(matcher));
        self
    }

    /// Override method comparison
    #[must_use]
    pub fn with_method_matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(Option<&str>, Option<&str>, &dyn Fn() -> bool) -> bool + Send + Sync + 'static,
    {
        self.method_matcher = Some(Arc::new(matcher));
        self
    }

    /// Override body comparison
    #[must_use]
    pub fn with_body_matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(Option<&str>, Option<&str>, &dyn Fn() -> bool) -> bool + Send + Sync + 'static,
    {
        self.body_matcher = Some(Arc::new(matcher));
        self
    }

    /// Override header comparison
    #[must_use]
    pub fn with_headers_matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(Option<&str>, Option<&str>, &dyn Fn() -> bool) -> bool + Send + Sync + 'static,
    {
        self.headers_matcher = Some(Arc::new(matcher));
        self
    }

    /// Exclude a header from comparison
    #[must_use]
    pub fn omit_header(mut self, name: impl Into<String>) -> Self {
        self.headers_to_omit.insert(name.into());
        self
    }

    /// Enable or disable debug reporting
    #[must_use]
    pub fn debugging(mut self, enabled: bool) -> Self {
        self.debugging_enabled = enabled;
        self
    }

    /// Set the debug listener port
    #[must_use]
    pub fn debug_port(mut self, port: u16) -> Self {
        self.debug_port = port;
        self
    }

    /// Whether a header name is excluded from comparison
    #[must_use]
    pub fn is_omitted(&self, name: &str) -> bool {
        self.headers_to_omit
            .iter()
            .any(|omitted| omitted.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = MatchingConfig::default();

        assert!(config.debugging_enabled);
        assert_eq!(config.debug_port, 9091);
        assert!(config.headers_to_omit.is_empty());
        assert!(config.url_matcher.is_none());
        assert!(config.headers_matcher.is_none());
    }

    #[test]
    fn test_settings_parse_partial() {
        let settings_toml = r#"
            headers_to_omit = ["Authorization", "Date"]
        "#;

        let settings: ReplaySettings = toml::from_str(settings_toml).unwrap();
        assert_eq!(settings.headers_to_omit.len(), 2);
        assert!(settings.debugging_enabled);
        assert_eq!(settings.debug_port, DEFAULT_DEBUG_PORT);
    }

    #[test]
    fn test_settings_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        let settings_toml = r#"
            debugging_enabled = false
            debug_port = 9200
        "#;
        file.write_all(settings_toml.as_bytes()).unwrap();

        let settings = ReplaySettings::from_file(file.path()).unwrap();
        assert!(!settings.debugging_enabled);
        assert_eq!(settings.debug_port, 9200);
    }

    #[test]
    fn test_invalid_port() {
        let settings = ReplaySettings {
            debug_port: 0,
            ..ReplaySettings::default()
        };

        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_empty_header_name() {
        let settings = ReplaySettings {
            headers_to_omit: vec!["  ".to_string()],
            ..ReplaySettings::default()
        };

        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = ReplaySettings::from_file(Path::new("/nonexistent/tundra.toml"));
        assert!(matches!(
            result,
            Err(TundraError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound
        ));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"debug_port = \"not a port\"").unwrap();

        let result = ReplaySettings::from_file(file.path());
        assert!(matches!(result, Err(TundraError::ConfigError(_))));
    }

    #[test]
    fn test_omitted_case_insensitive() {
        let config = MatchingConfig::default().omit_header("Authorization");

        assert!(config.is_omitted("authorization"));
        assert!(config.is_omitted("AUTHORIZATION"));
        assert!(!config.is_omitted("Accept"));
    }

    #[test]
    fn test_builder_sets_matchers() {
        let config = MatchingConfig::default()
            .with_body_matcher(|_, _, default| default())
            .debugging(false)
            .debug_port(9300);

        assert!(config.body_matcher.is_some());
        assert!(config.url_matcher.is_none());
        assert!(!config.debugging_enabled);
        assert_eq!(config.debug_port, 9300);
        assert!(format!("{config:?}").contains("body_matcher: true"));
    }
}
