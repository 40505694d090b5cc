//! Tracing subscriber setup for the binary

use crate::config::LogFormat;
use tracing_subscriber::EnvFilter;

/// Filter used when neither `--log-level` nor `RUST_LOG` is given
pub const DEFAULT_FILTER: &str = "info";

/// Logging setup errors
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Filter directive did not parse
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),

    /// A global subscriber is already installed
    #[error("cannot install subscriber: {0}")]
    Init(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Build the filter: explicit directive, else `RUST_LOG`, else [`DEFAULT_FILTER`]
///
/// # Errors
/// Returns [`LogError::InvalidFilter`] if `directive` does not parse.
pub fn env_filter(directive: Option<&str>) -> Result<EnvFilter, LogError> {
    match directive {
        Some(directive) => Ok(EnvFilter::try_new(directive)?),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Install the global subscriber, writing to stderr
///
/// # Errors
/// Returns error if the filter is invalid or a subscriber is already set.
pub fn init_tracing(directive: Option<&str>, format: LogFormat) -> Result<(), LogError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(directive)?)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(LogError::Init)
}
