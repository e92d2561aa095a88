//! A recording stand-in for [`TestLifecycle`].

use std::sync::atomic::{AtomicBool, Ordering};

use camino::Utf8PathBuf;
use qtest_harness::{Args, Cleanup, IntoArg, TestLifecycle, args};
use strum::IntoEnumIterator;
use tracing::{debug, trace};

use crate::operation::Operation;
use crate::recorder::Recorder;
use crate::termination;

const TARGET: &str = "qmock::stub";

/// Records every lifecycle call made by the code under test.
///
/// Each operation appends a [`Call`](crate::Call) to its own [`Recorder`]
/// before doing anything else. Failure and skip reports set sticky flags
/// instead of touching the real harness; `fail_now`, `fatal` and `fatalf`
/// then stop the calling code by unwinding with a
/// [`StubTermination`](crate::StubTermination), which
/// [`absorb_termination`](crate::absorb_termination) turns back into a value.
///
/// `name`, `temp_dir` and `cleanup` are passed through to `harness`, so
/// directories and cleanups are owned by the real test.
///
/// ```
/// use qmock::{LifecycleStub, Outcome, absorb_termination};
/// use qtest_harness::{TestContext, TestLifecycle, args};
///
/// fn check_positive(t: &dyn TestLifecycle, value: i32) {
///     if value <= 0 {
///         t.fatalf("expected a positive value, got {}", args![value]);
///     }
///     t.log(args!["value accepted"]);
/// }
///
/// let context = TestContext::new("check_positive");
/// let stub = LifecycleStub::new(&context);
///
/// let outcome: Outcome<()> = absorb_termination(|| check_positive(&stub, -1));
/// assert!(outcome.is_terminated());
/// assert_eq!(stub.fatalf_calls().call_count(), 1);
/// assert_eq!(stub.log_calls().call_count(), 0);
/// assert!(
///     stub.fatalf_calls()
///         .call(0)
///         .verify_args(&args!["expected a positive value, got {}", -1])
///         .is_ok()
/// );
/// ```
#[derive(Debug)]
pub struct LifecycleStub<H> {
    harness: H,
    cleanup_calls: Recorder,
    error_calls: Recorder,
    errorf_calls: Recorder,
    fail_calls: Recorder,
    fail_now_calls: Recorder,
    failed_calls: Recorder,
    fatal_calls: Recorder,
    fatalf_calls: Recorder,
    helper_calls: Recorder,
    log_calls: Recorder,
    logf_calls: Recorder,
    name_calls: Recorder,
    skip_calls: Recorder,
    skip_now_calls: Recorder,
    skipf_calls: Recorder,
    skipped_calls: Recorder,
    temp_dir_calls: Recorder,
    failed: AtomicBool,
    skipped: AtomicBool,
    terminating_skips: bool,
}

impl<H> LifecycleStub<H> {
    /// Creates a stub that passes `name`, `temp_dir` and `cleanup` through to
    /// `harness`.
    ///
    /// The first stub created in a process also stops the panic hook from
    /// reporting [`StubTermination`](crate::StubTermination) unwinds that
    /// [`absorb_termination`](crate::absorb_termination) will absorb.
    #[must_use]
    pub fn new(harness: H) -> Self {
        termination::silence_absorbed_reports();
        Self {
            harness,
            cleanup_calls: Recorder::new(),
            error_calls: Recorder::new(),
            errorf_calls: Recorder::new(),
            fail_calls: Recorder::new(),
            fail_now_calls: Recorder::new(),
            failed_calls: Recorder::new(),
            fatal_calls: Recorder::new(),
            fatalf_calls: Recorder::new(),
            helper_calls: Recorder::new(),
            log_calls: Recorder::new(),
            logf_calls: Recorder::new(),
            name_calls: Recorder::new(),
            skip_calls: Recorder::new(),
            skip_now_calls: Recorder::new(),
            skipf_calls: Recorder::new(),
            skipped_calls: Recorder::new(),
            temp_dir_calls: Recorder::new(),
            failed: AtomicBool::new(false),
            skipped: AtomicBool::new(false),
            terminating_skips: false,
        }
    }

    /// Makes `skip`, `skip_now` and `skipf` stop the calling code the same
    /// way `fail_now` does.
    #[must_use]
    pub const fn with_terminating_skips(mut self) -> Self {
        self.terminating_skips = true;
        self
    }

    /// Returns `true` when skip operations stop the calling code.
    #[must_use]
    pub const fn terminates_on_skip(&self) -> bool {
        self.terminating_skips
    }

    /// Returns the real harness behind the stub.
    #[must_use]
    pub const fn harness(&self) -> &H {
        &self.harness
    }

    /// Clears every recorder and both flags.
    ///
    /// Intended for reuse between sequential test phases; calls recorded
    /// concurrently with a reset may or may not survive it.
    pub fn reset_all(&self) {
        for operation in Operation::iter() {
            self.recorder(operation).reset();
        }
        self.failed.store(false, Ordering::SeqCst);
        self.skipped.store(false, Ordering::SeqCst);
        debug!(target: TARGET, "stub reset");
    }

    fn record(&self, operation: Operation, args: Args) {
        trace!(target: TARGET, %operation, arg_count = args.len(), "stub called");
        self.recorder(operation).add_call(args);
    }

    fn mark_failed(&self) {
        self.failed.store(true, Ordering::SeqCst);
    }

    fn mark_skipped(&self, operation: Operation) {
        self.skipped.store(true, Ordering::SeqCst);
        if self.terminating_skips {
            termination::raise(operation);
        }
    }
}

macro_rules! recorder_accessors {
    ($($field:ident => $operation:ident),+ $(,)?) => {
        impl<H> LifecycleStub<H> {
            $(
                #[doc = concat!("Returns the recorder for [`Operation::", stringify!($operation), "`].")]
                #[must_use]
                pub const fn $field(&self) -> &Recorder {
                    &self.$field
                }
            )+

            /// Returns the recorder for `operation`.
            #[must_use]
            pub const fn recorder(&self, operation: Operation) -> &Recorder {
                match operation {
                    $(Operation::$operation => &self.$field,)+
                }
            }
        }
    };
}

recorder_accessors! {
    cleanup_calls => Cleanup,
    error_calls => Error,
    errorf_calls => Errorf,
    fail_calls => Fail,
    fail_now_calls => FailNow,
    failed_calls => Failed,
    fatal_calls => Fatal,
    fatalf_calls => Fatalf,
    helper_calls => Helper,
    log_calls => Log,
    logf_calls => Logf,
    name_calls => Name,
    skip_calls => Skip,
    skip_now_calls => SkipNow,
    skipf_calls => Skipf,
    skipped_calls => Skipped,
    temp_dir_calls => TempDir,
}

/// Puts the format string at index 0, followed by each argument.
fn with_format(format: &str, args: Args) -> Args {
    let mut flattened = Vec::with_capacity(args.len() + 1);
    flattened.push(format.into_arg());
    flattened.extend(args);
    flattened
}

impl<H: TestLifecycle> TestLifecycle for LifecycleStub<H> {
    fn cleanup(&self, action: Cleanup) {
        self.record(Operation::Cleanup, args![action.clone()]);
        self.harness.cleanup(action);
    }

    fn error(&self, args: Args) {
        self.record(Operation::Error, args);
        self.mark_failed();
    }

    fn errorf(&self, format: &str, args: Args) {
        self.record(Operation::Errorf, with_format(format, args));
        self.mark_failed();
    }

    fn fail(&self) {
        self.record(Operation::Fail, args![]);
        self.mark_failed();
    }

    fn fail_now(&self) -> ! {
        self.record(Operation::FailNow, args![]);
        self.mark_failed();
        termination::raise(Operation::FailNow)
    }

    fn failed(&self) -> bool {
        self.record(Operation::Failed, args![]);
        self.failed.load(Ordering::SeqCst)
    }

    fn fatal(&self, args: Args) -> ! {
        self.record(Operation::Fatal, args);
        self.mark_failed();
        termination::raise(Operation::Fatal)
    }

    fn fatalf(&self, format: &str, args: Args) -> ! {
        self.record(Operation::Fatalf, with_format(format, args));
        self.mark_failed();
        termination::raise(Operation::Fatalf)
    }

    fn helper(&self) {
        self.record(Operation::Helper, args![]);
    }

    fn log(&self, args: Args) {
        self.record(Operation::Log, args);
    }

    fn logf(&self, format: &str, args: Args) {
        self.record(Operation::Logf, with_format(format, args));
    }

    fn name(&self) -> String {
        self.record(Operation::Name, args![]);
        self.harness.name()
    }

    fn skip(&self, args: Args) {
        self.record(Operation::Skip, args);
        self.mark_skipped(Operation::Skip);
    }

    fn skip_now(&self) {
        self.record(Operation::SkipNow, args![]);
        self.mark_skipped(Operation::SkipNow);
    }

    fn skipf(&self, format: &str, args: Args) {
        self.record(Operation::Skipf, with_format(format, args));
        self.mark_skipped(Operation::Skipf);
    }

    fn skipped(&self) -> bool {
        self.record(Operation::Skipped, args![]);
        self.skipped.load(Ordering::SeqCst)
    }

    fn temp_dir(&self) -> Utf8PathBuf {
        self.record(Operation::TempDir, args![]);
        self.harness.temp_dir()
    }
}
