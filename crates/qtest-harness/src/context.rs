//! A real, scoped implementation of [`TestLifecycle`].

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

use camino::Utf8PathBuf;
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

use crate::arg::Args;
use crate::args;
use crate::format::{render_args, render_format};
use crate::hook::silence_panic_reports;
use crate::lifecycle::{Cleanup, TestLifecycle};

const TARGET: &str = "qtest::context";

thread_local! {
    static ABSORBING: Cell<usize> = const { Cell::new(0) };
}

/// Final status of a test body executed by [`TestContext::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TestStatus {
    /// The body completed without reporting a failure.
    Passed,
    /// The body reported a failure.
    Failed,
    /// The body skipped itself without reporting a failure.
    Skipped,
}

/// Summary of a finished test body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    name: String,
    status: TestStatus,
    messages: Vec<String>,
}

impl TestOutcome {
    /// Returns the test name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the final status.
    #[must_use]
    pub const fn status(&self) -> TestStatus {
        self.status
    }

    /// Returns every message logged, in order.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

#[derive(Debug, Clone, Copy)]
enum AbortReason {
    Failed,
    Skipped,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed => f.write_str("failed"),
            Self::Skipped => f.write_str("skipped"),
        }
    }
}

/// Unwind payload that stops a body running under [`TestContext::run`].
#[derive(Debug)]
struct TestAborted;

#[derive(Default)]
struct ContextState {
    messages: Vec<String>,
    cleanups: Vec<Cleanup>,
    temp_dirs: Vec<TempDir>,
}

/// Harness state for a single test.
///
/// Messages are recorded and forwarded to `tracing`. Registered cleanups run
/// in reverse order of registration when the context tears down, followed
/// by removal of every directory handed out by [`TestLifecycle::temp_dir`].
/// Teardown happens at the end of [`TestContext::run`] or when the context is
/// dropped.
///
/// Stopping operations (`fail_now`, `fatal`, `skip`, ...) unwind. Inside
/// [`TestContext::run`] the unwind is absorbed and reflected in the returned
/// [`TestOutcome`]. Outside it the unwind carries a readable message and
/// fails the enclosing `#[test]`; libtest cannot skip a test at runtime, so
/// a skip there is reported as a failure too.
///
/// ```
/// use qtest_harness::{TestContext, TestLifecycle, TestStatus, args};
///
/// let outcome = TestContext::run("example", |t| {
///     t.log(args!["starting"]);
///     t.fatalf("expected {}, found {}", args![1, 2]);
/// });
/// assert_eq!(outcome.status(), TestStatus::Failed);
/// assert_eq!(outcome.messages(), ["starting", "expected 1, found 2"]);
/// ```
pub struct TestContext {
    name: String,
    failed: AtomicBool,
    skipped: AtomicBool,
    state: Mutex<ContextState>,
}

impl TestContext {
    /// Creates a context for the named test.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        silence_panic_reports::<TestAborted>();
        Self {
            name: name.into(),
            failed: AtomicBool::new(false),
            skipped: AtomicBool::new(false),
            state: Mutex::new(ContextState::default()),
        }
    }

    /// Creates a context named after the current thread.
    ///
    /// libtest names each test thread after the test's path.
    #[must_use]
    pub fn for_current_thread() -> Self {
        Self::new(thread::current().name().unwrap_or("unnamed"))
    }

    /// Runs `body` against a fresh context and reports how it finished.
    ///
    /// Teardown runs before this returns. Panics that did not originate from
    /// the context are resumed after teardown.
    pub fn run<F>(name: impl Into<String>, body: F) -> TestOutcome
    where
        F: FnOnce(&Self),
    {
        let context = Self::new(name);
        debug!(target: TARGET, test = %context.name, "running test body");

        let result = absorbing(|| body(&context));
        context.teardown();
        if let Err(payload) = result {
            if !payload.is::<TestAborted>() {
                panic::resume_unwind(payload);
            }
        }

        let outcome = context.outcome();
        debug!(target: TARGET, test = %outcome.name, status = %outcome.status, "test body finished");
        outcome
    }

    /// Returns the messages logged so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.lock_state().messages.clone()
    }

    /// Summarises the context's current state.
    #[must_use]
    pub fn outcome(&self) -> TestOutcome {
        let status = if self.failed.load(Ordering::SeqCst) {
            TestStatus::Failed
        } else if self.skipped.load(Ordering::SeqCst) {
            TestStatus::Skipped
        } else {
            TestStatus::Passed
        };
        TestOutcome {
            name: self.name.clone(),
            status,
            messages: self.messages(),
        }
    }

    /// Runs pending cleanups, newest first, then removes temporary directories.
    ///
    /// Cleanups registered while tearing down also run. Calling this more
    /// than once is harmless.
    pub fn teardown(&self) {
        let mut foreign_panic: Option<Box<dyn Any + Send>> = None;

        while let Some(cleanup) = self.pop_cleanup() {
            if let Err(payload) = absorbing(|| {
                cleanup.run();
            }) {
                if !payload.is::<TestAborted>() && foreign_panic.is_none() {
                    foreign_panic = Some(payload);
                }
            }
        }

        let temp_dirs = std::mem::take(&mut self.lock_state().temp_dirs);
        for dir in temp_dirs {
            let path = dir.path().to_path_buf();
            if let Err(error) = dir.close() {
                warn!(
                    target: TARGET,
                    test = %self.name,
                    path = %path.display(),
                    error = %error,
                    "failed to remove temporary directory"
                );
            }
        }

        if let Some(payload) = foreign_panic {
            if thread::panicking() {
                error!(target: TARGET, test = %self.name, "cleanup panicked during unwinding");
            } else {
                panic::resume_unwind(payload);
            }
        }
    }

    fn pop_cleanup(&self) -> Option<Cleanup> {
        self.lock_state().cleanups.pop()
    }

    fn lock_state(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, message: String, is_failure: bool) {
        if is_failure {
            error!(target: TARGET, test = %self.name, "{message}");
        } else {
            info!(target: TARGET, test = %self.name, "{message}");
        }
        self.lock_state().messages.push(message);
    }

    fn abort(&self, reason: AbortReason) -> ! {
        if ABSORBING.with(Cell::get) > 0 {
            panic::panic_any(TestAborted);
        }
        let messages = self.messages();
        if messages.is_empty() {
            panic!("test {} {reason}", self.name);
        }
        panic!("test {} {reason}: {}", self.name, messages.join("; "));
    }

    fn mark_skipped(&self, message: Option<String>) -> ! {
        if let Some(text) = message {
            self.record(text, false);
        }
        self.skipped.store(true, Ordering::SeqCst);
        self.abort(AbortReason::Skipped)
    }
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("name", &self.name)
            .field("failed", &self.failed.load(Ordering::SeqCst))
            .field("skipped", &self.skipped.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl TestLifecycle for TestContext {
    fn cleanup(&self, action: Cleanup) {
        debug!(target: TARGET, test = %self.name, "registering cleanup");
        self.lock_state().cleanups.push(action);
    }

    fn error(&self, args: Args) {
        self.record(render_args(&args), true);
        self.fail();
    }

    fn errorf(&self, format: &str, args: Args) {
        self.record(render_format(format, &args), true);
        self.fail();
    }

    fn fail(&self) {
        self.failed.store(true, Ordering::SeqCst);
    }

    fn fail_now(&self) -> ! {
        self.fail();
        self.abort(AbortReason::Failed)
    }

    fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    fn fatal(&self, args: Args) -> ! {
        self.error(args);
        self.abort(AbortReason::Failed)
    }

    fn fatalf(&self, format: &str, args: Args) -> ! {
        self.errorf(format, args);
        self.abort(AbortReason::Failed)
    }

    fn helper(&self) {}

    fn log(&self, args: Args) {
        self.record(render_args(&args), false);
    }

    fn logf(&self, format: &str, args: Args) {
        self.record(render_format(format, &args), false);
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn skip(&self, args: Args) {
        self.mark_skipped(Some(render_args(&args)));
    }

    fn skip_now(&self) {
        self.mark_skipped(None);
    }

    fn skipf(&self, format: &str, args: Args) {
        self.mark_skipped(Some(render_format(format, &args)));
    }

    fn skipped(&self) -> bool {
        self.skipped.load(Ordering::SeqCst)
    }

    fn temp_dir(&self) -> Utf8PathBuf {
        let prefix = format!("{}-", sanitise(&self.name));
        let dir = match tempfile::Builder::new().prefix(&prefix).tempdir() {
            Ok(dir) => dir,
            Err(error) => self.fatalf("temp_dir: {}", args![error.to_string()]),
        };
        let path = match Utf8PathBuf::from_path_buf(dir.path().to_path_buf()) {
            Ok(path) => path,
            Err(raw) => self.fatalf(
                "temp_dir: {} is not valid UTF-8",
                args![raw.display().to_string()],
            ),
        };
        self.lock_state().temp_dirs.push(dir);
        path
    }
}

/// Runs `action`, catching any unwind; stopping operations raised meanwhile
/// on this thread use the silent [`TestAborted`] payload.
fn absorbing<F: FnOnce()>(action: F) -> Result<(), Box<dyn Any + Send>> {
    ABSORBING.with(|depth| depth.set(depth.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(action));
    ABSORBING.with(|depth| depth.set(depth.get().saturating_sub(1)));
    result
}

fn sanitise(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}
