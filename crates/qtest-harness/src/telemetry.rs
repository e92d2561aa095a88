//! `tracing` output for test runs.
//!
//! Harness events go through libtest's capture writer: they stay hidden for
//! passing tests and are printed alongside the failure report otherwise, or
//! always under `--nocapture`.

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::config::{LogFormat, TelemetryConfig};
use crate::error::TelemetryError;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Proof that the test process has a subscriber installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Installs the process-wide subscriber for the test binary.
///
/// Safe to call from every test: only the first successful call installs
/// anything, and later calls return a handle straight away, whatever
/// configuration they pass.
///
/// ```
/// use qtest_harness::{LogFormat, TelemetryConfig, telemetry};
///
/// let config = TelemetryConfig::new("qmock=debug", LogFormat::Compact);
/// assert!(telemetry::initialise(&config).is_ok());
/// assert!(telemetry::initialise(&TelemetryConfig::default()).is_ok());
/// ```
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter and
/// [`TelemetryError::Subscriber`] when something other than this crate
/// already installed a global subscriber.
pub fn initialise(config: &TelemetryConfig) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install(config))
        .map(|_| TelemetryHandle)
}

/// Installs the subscriber using `QTEST_LOG` and `QTEST_LOG_FORMAT`.
///
/// # Errors
///
/// Returns [`TelemetryError::Config`] when `QTEST_LOG_FORMAT` names an
/// unknown format, and otherwise the errors of [`initialise`].
pub fn initialise_from_env() -> Result<TelemetryHandle, TelemetryError> {
    initialise(&TelemetryConfig::from_env()?)
}

fn install(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    // Thread names carry the libtest test path, which identifies the test
    // when several run in parallel.
    let events = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_test_writer()
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(events.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(events.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
