//! Runtime configuration
//!
//! [`RuntimeConfig`] can be built in code with the `with_*` setters or
//! loaded from TOML. Missing keys take their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Enable advice on a type the first time it is advised
    pub auto_enable_advice: bool,
    /// Forward definition events to observers registered on advised types
    pub forward_definition_observers: bool,
    /// Emit a trace event for every invocation
    pub trace_invocations: bool,
    /// Log output format for the binary
    pub log_format: LogFormat,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            auto_enable_advice: true,
            forward_definition_observers: true,
            trace_invocations: false,
            log_format: LogFormat::Pretty,
        }
    }
}

impl RuntimeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With auto-enable of advice
    #[inline]
    #[must_use]
    pub fn with_auto_enable_advice(mut self, enabled: bool) -> Self {
        self.auto_enable_advice = enabled;
        self
    }

    /// With observer forwarding
    #[inline]
    #[must_use]
    pub fn with_forward_definition_observers(mut self, enabled: bool) -> Self {
        self.forward_definition_observers = enabled;
        self
    }

    /// With invocation tracing
    #[inline]
    #[must_use]
    pub fn with_trace_invocations(mut self, enabled: bool) -> Self {
        self.trace_invocations = enabled;
        self
    }

    /// With log format
    #[inline]
    #[must_use]
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not a valid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,

    /// One JSON object per event
    Json,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Path given
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Invalid TOML or unknown keys
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = RuntimeConfig::new();
        assert!(config.auto_enable_advice);
        assert!(config.forward_definition_observers);
        assert!(!config.trace_invocations);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn builder_setters() {
        let config = RuntimeConfig::new()
            .with_auto_enable_advice(false)
            .with_trace_invocations(true)
            .with_log_format(LogFormat::Json);
        assert!(!config.auto_enable_advice);
        assert!(config.trace_invocations);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config = RuntimeConfig::from_toml_str("trace_invocations = true\n").unwrap();
        assert!(config.trace_invocations);
        assert!(config.auto_enable_advice);
    }

    #[test]
    fn full_toml() {
        let text = r#"
            auto_enable_advice = false
            forward_definition_observers = false
            trace_invocations = true
            log_format = "json"
        "#;
        let config = RuntimeConfig::from_toml_str(text).unwrap();
        assert_eq!(
            config,
            RuntimeConfig::new()
                .with_auto_enable_advice(false)
                .with_forward_definition_observers(false)
                .with_trace_invocations(true)
                .with_log_format(LogFormat::Json)
        );
    }

    #[test]
    fn unknown_key_rejected() {
        let err = RuntimeConfig::from_toml_str("thread_safe = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_format = \"json\"").unwrap();

        let config = RuntimeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn missing_file() {
        let err = RuntimeConfig::from_file("/nonexistent/advice.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
