//! Errors raised while configuring the harness.

use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;

/// Errors raised while reading [`TelemetryConfig`](crate::TelemetryConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held an unrecognised log format.
    #[error("invalid log format {value:?} in {variable}: {source}")]
    InvalidLogFormat {
        /// Environment variable that was read.
        variable: &'static str,
        /// Value found in the variable.
        value: String,
        /// Parse failure reported by `strum`.
        #[source]
        source: strum::ParseError,
    },
}

impl ConfigError {
    /// Creates a new `InvalidLogFormat` error.
    #[must_use]
    pub fn invalid_log_format(
        variable: &'static str,
        value: impl Into<String>,
        source: strum::ParseError,
    ) -> Self {
        Self::InvalidLogFormat {
            variable,
            value: value.into(),
            source,
        }
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configuration could not be read.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}
