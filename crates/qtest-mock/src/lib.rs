//! A recording stub of [`TestLifecycle`](qtest_harness::TestLifecycle).
//!
//! Test helpers that report through the lifecycle interface are themselves
//! worth testing: did the helper fail the test, with which message, and did
//! it stop? [`LifecycleStub`] answers those questions by recording each call
//! in a per-operation [`Recorder`] and keeping sticky `failed` and `skipped`
//! flags, while passing `name`, `temp_dir` and `cleanup` through to a real
//! harness.
//!
//! Recorded [`Call`]s are checked with [`Call::verify_arg`] and
//! [`Call::verify_args`], which report mismatches as [`VerifyError`] values
//! rather than panicking. Operations that stop a test unwind with a
//! [`StubTermination`]; wrap the code under test in [`absorb_termination`]
//! to observe that as an [`Outcome`].
//!
//! ```
//! use qmock::{LifecycleStub, Outcome, absorb_termination};
//! use qtest_harness::{TestContext, TestLifecycle, args};
//!
//! let context = TestContext::new("lib_example");
//! let stub = LifecycleStub::new(&context);
//!
//! stub.errorf("Format {}", args!["value"]);
//! assert!(stub.failed());
//!
//! let call = stub.errorf_calls().call(0);
//! assert!(call.verify_args(&args!["Format {}", "value"]).is_ok());
//! assert_eq!(
//!     call.verify_arg(5, "value").map_err(|error| error.to_string()),
//!     Err("unknown arg: index 5".to_owned()),
//! );
//!
//! let outcome: Outcome<()> = absorb_termination(|| stub.fatal(args!["stop"]));
//! assert!(outcome.is_terminated());
//! ```

mod call;
mod error;
mod operation;
mod recorder;
mod stub;
mod termination;

pub use call::Call;
pub use error::{Side, VerifyError};
pub use operation::Operation;
pub use recorder::Recorder;
pub use stub::LifecycleStub;
pub use termination::{Outcome, StubTermination, absorb_termination, is_stub_termination};

#[cfg(test)]
mod tests;
