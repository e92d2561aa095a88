//! Test lifecycle interface and a scoped harness implementing it.
//!
//! Code that needs to report failures, log, skip, register cleanups or
//! allocate temporary directories can be written against the
//! [`TestLifecycle`] trait instead of a concrete harness. This crate
//! provides:
//!
//! - [`TestLifecycle`], the operation set, with forwarding implementations
//!   for `&T`, `Arc<T>` and `Box<T>`.
//! - [`Arg`] and the [`args!`] macro, the type-erased variadic arguments
//!   the operations accept.
//! - [`Cleanup`], a shareable deferred action.
//! - [`TestContext`], a real harness with LIFO cleanups, owned temporary
//!   directories and [`TestContext::run`] for scoped execution.
//! - [`TelemetryConfig`] and [`telemetry::initialise`] for `tracing` output
//!   captured by libtest.
//!
//! ```
//! use qtest_harness::{TestContext, TestLifecycle, TestStatus, args};
//!
//! fn check_answer(t: &dyn TestLifecycle, answer: u32) {
//!     t.helper();
//!     if answer != 42 {
//!         t.errorf("wrong answer {}", args![answer]);
//!     }
//! }
//!
//! let outcome = TestContext::run("answers", |t| check_answer(t, 41));
//! assert_eq!(outcome.status(), TestStatus::Failed);
//! assert_eq!(outcome.messages(), ["wrong answer 41"]);
//! ```

mod arg;
mod config;
mod context;
mod error;
mod format;
mod hook;
mod lifecycle;
pub mod telemetry;

pub use arg::{Arg, Args, IntoArg};
pub use config::{LOG_FILTER_ENV, LOG_FORMAT_ENV, LogFormat, TelemetryConfig};
pub use context::{TestContext, TestOutcome, TestStatus};
pub use error::{ConfigError, TelemetryError};
pub use format::{render_args, render_format};
pub use hook::{silence_panic_reports, silence_panic_reports_if};
pub use lifecycle::{Cleanup, TestLifecycle};

#[cfg(test)]
mod tests;
