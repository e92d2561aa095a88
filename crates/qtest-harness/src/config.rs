//! Telemetry configuration for harness-driven tests.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ConfigError;

/// Environment variable holding the log filter expression.
pub const LOG_FILTER_ENV: &str = "QTEST_LOG";

/// Environment variable holding the log output format.
pub const LOG_FORMAT_ENV: &str = "QTEST_LOG_FORMAT";

const DEFAULT_LOG_FILTER: &str = "warn";

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON, one event per line.
    Json,
    /// Human-readable single line output.
    #[default]
    Compact,
}

/// Logging settings used by [`telemetry::initialise`](crate::telemetry::initialise).
///
/// Missing fields fall back to their defaults when deserialised, so the type
/// can be embedded in a larger configuration file.
///
/// ```
/// use qtest_harness::{LogFormat, TelemetryConfig};
///
/// let config = TelemetryConfig::default();
/// assert_eq!(config.log_filter(), "warn");
/// assert_eq!(config.log_format(), LogFormat::Compact);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    log_filter: String,
    log_format: LogFormat,
}

impl TelemetryConfig {
    /// Creates a configuration with explicit values.
    #[must_use]
    pub fn new(log_filter: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            log_filter: log_filter.into(),
            log_format,
        }
    }

    /// Reads overrides from [`LOG_FILTER_ENV`] and [`LOG_FORMAT_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLogFormat`] when the format variable
    /// names an unknown format.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads overrides through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// Blank values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLogFormat`] when the format variable
    /// names an unknown format.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(filter) = read(LOG_FILTER_ENV) {
            config.log_filter = filter;
        }
        if let Some(format) = read(LOG_FORMAT_ENV) {
            config.log_format = LogFormat::from_str(format.trim()).map_err(|error| {
                ConfigError::invalid_log_format(LOG_FORMAT_ENV, format.as_str(), error)
            })?;
        }
        Ok(config)
    }

    /// Returns the `tracing_subscriber::EnvFilter` expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: String::from(DEFAULT_LOG_FILTER),
            log_format: LogFormat::default(),
        }
    }
}
