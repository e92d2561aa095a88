//! Tests for [`LifecycleStub`] recording, flags and termination.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use qtest_harness::{Arg, Cleanup, TestContext, TestLifecycle, args};
use rstest::{fixture, rstest};
use strum::{EnumCount, IntoEnumIterator};

use crate::{LifecycleStub, Operation, Outcome, Recorder, absorb_termination};

type Stub = LifecycleStub<TestContext>;

#[fixture]
fn stub() -> Stub {
    LifecycleStub::new(TestContext::new("qmock_stub"))
}

fn error(stub: &Stub) {
    stub.error(args!["boom"]);
}

fn errorf(stub: &Stub) {
    stub.errorf("Format {}", args!["boom"]);
}

fn fail(stub: &Stub) {
    stub.fail();
}

fn skip(stub: &Stub) {
    stub.skip(args!["later"]);
}

fn skip_now(stub: &Stub) {
    stub.skip_now();
}

fn skipf(stub: &Stub) {
    stub.skipf("Format {}", args!["later"]);
}

fn helper(stub: &Stub) {
    stub.helper();
}

fn log(stub: &Stub) {
    stub.log(args!["note"]);
}

fn logf(stub: &Stub) {
    stub.logf("Format {}", args!["note"]);
}

fn fail_now(stub: &Stub) {
    stub.fail_now();
}

fn fatal(stub: &Stub) {
    stub.fatal(args!["boom"]);
}

fn fatalf(stub: &Stub) {
    stub.fatalf("Format {}", args!["boom"]);
}

#[rstest]
#[case::error(Operation::Error, error as fn(&Stub), true, false)]
#[case::errorf(Operation::Errorf, errorf as fn(&Stub), true, false)]
#[case::fail(Operation::Fail, fail as fn(&Stub), true, false)]
#[case::skip(Operation::Skip, skip as fn(&Stub), false, true)]
#[case::skip_now(Operation::SkipNow, skip_now as fn(&Stub), false, true)]
#[case::skipf(Operation::Skipf, skipf as fn(&Stub), false, true)]
#[case::helper(Operation::Helper, helper as fn(&Stub), false, false)]
#[case::log(Operation::Log, log as fn(&Stub), false, false)]
#[case::logf(Operation::Logf, logf as fn(&Stub), false, false)]
fn returning_operations_record_and_set_flags(
    stub: Stub,
    #[case] operation: Operation,
    #[case] invoke: fn(&Stub),
    #[case] failed: bool,
    #[case] skipped: bool,
) {
    let outcome = absorb_termination(|| invoke(&stub));

    assert!(outcome.is_finished());
    assert_eq!(stub.recorder(operation).call_count(), 1);
    assert_eq!(stub.failed(), failed);
    assert_eq!(stub.skipped(), skipped);
}

#[rstest]
#[case::fail_now(Operation::FailNow, fail_now as fn(&Stub))]
#[case::fatal(Operation::Fatal, fatal as fn(&Stub))]
#[case::fatalf(Operation::Fatalf, fatalf as fn(&Stub))]
fn terminating_operations_record_then_stop(
    stub: Stub,
    #[case] operation: Operation,
    #[case] invoke: fn(&Stub),
) {
    let mut reached_end = false;

    let outcome = absorb_termination(|| {
        invoke(&stub);
        reached_end = true;
    });

    assert_eq!(outcome.termination().map(|t| t.operation()), Some(operation));
    assert!(operation.is_terminating());
    assert!(!reached_end);
    assert_eq!(stub.recorder(operation).call_count(), 1);
    assert!(stub.failed());
    assert!(!stub.skipped());
}

#[rstest]
fn formatted_calls_flatten_the_format_and_arguments(stub: Stub) {
    stub.errorf("Format {}", args!["value"]);

    let call = stub.errorf_calls().call(0);
    assert_eq!(call.arg_count(), 2);
    assert_eq!(call.verify_arg(0, "Format {}"), Ok(()));
    assert_eq!(call.verify_arg(1, "value"), Ok(()));
    assert_eq!(call.verify_args(&args!["Format {}", "value"]), Ok(()));
    assert_eq!(
        call.verify_arg(2, "value").map_err(|error| error.to_string()),
        Err("unknown arg: index 2".to_owned())
    );
}

#[rstest]
fn formatted_calls_without_arguments_record_only_the_format(stub: Stub) {
    stub.logf("plain", args![]);

    assert_eq!(stub.logf_calls().call(0).verify_args(&args!["plain"]), Ok(()));
}

#[rstest]
fn variadic_calls_record_arguments_as_given(stub: Stub) {
    stub.log(args!["count", 3_u16, None::<String>]);

    let call = stub.log_calls().call(0);
    assert_eq!(call.verify_args(&args!["count", 3_u16, None::<String>]), Ok(()));
    assert_eq!(
        call.verify_arg(1, 3_u32).map_err(|error| error.to_string()),
        Err("arg 1: expected type u32, actual type u16".to_owned())
    );
}

#[rstest]
fn flag_queries_are_recorded(stub: Stub) {
    assert!(!stub.failed());
    assert!(!stub.failed());
    assert!(!stub.skipped());

    assert_eq!(stub.failed_calls().call_count(), 2);
    assert_eq!(stub.skipped_calls().call_count(), 1);
}

#[rstest]
fn flags_stay_set_until_reset(stub: Stub) {
    stub.error(args!["first"]);
    stub.skip_now();
    stub.log(args!["later"]);
    stub.helper();

    assert!(stub.failed());
    assert!(stub.skipped());
}

#[rstest]
fn reset_all_clears_every_recorder_and_flag(stub: Stub) {
    stub.cleanup(Cleanup::new(|| {}));
    error(&stub);
    errorf(&stub);
    fail(&stub);
    skip(&stub);
    skip_now(&stub);
    skipf(&stub);
    helper(&stub);
    log(&stub);
    logf(&stub);
    let _name = stub.name();
    let _dir = stub.temp_dir();
    for invoke in [fail_now as fn(&Stub), fatal, fatalf] {
        let _terminated = absorb_termination(|| invoke(&stub));
    }
    assert!(stub.failed());
    assert!(stub.skipped());
    assert!(Operation::iter().all(|operation| stub.recorder(operation).call_count() == 1));

    stub.reset_all();

    assert!(Operation::iter().all(|operation| stub.recorder(operation).call_count() == 0));
    assert!(!stub.failed());
    assert!(!stub.skipped());
}

#[rstest]
fn handles_taken_before_reset_all_see_later_calls(stub: Stub) {
    let log_calls = stub.log_calls();
    let error_calls = stub.recorder(Operation::Error);
    stub.log(args!["before"]);
    stub.error(args!["before"]);
    stub.skip_now();

    stub.reset_all();
    assert_eq!(log_calls.call_count(), 0);

    stub.log(args!["after"]);
    stub.error(args!["after"]);
    stub.skip_now();

    assert_eq!(log_calls.call_count(), 1);
    assert_eq!(log_calls.call(0).verify_args(&args!["after"]), Ok(()));
    assert_eq!(error_calls.call_count(), 1);
    assert!(stub.failed());
    assert!(stub.skipped());
}

#[rstest]
#[case::cleanup(Operation::Cleanup, Stub::cleanup_calls as fn(&Stub) -> &Recorder)]
#[case::errorf(Operation::Errorf, Stub::errorf_calls as fn(&Stub) -> &Recorder)]
#[case::fail_now(Operation::FailNow, Stub::fail_now_calls as fn(&Stub) -> &Recorder)]
#[case::skipped(Operation::Skipped, Stub::skipped_calls as fn(&Stub) -> &Recorder)]
#[case::temp_dir(Operation::TempDir, Stub::temp_dir_calls as fn(&Stub) -> &Recorder)]
fn named_accessors_match_recorder_lookup(
    stub: Stub,
    #[case] operation: Operation,
    #[case] accessor: fn(&Stub) -> &Recorder,
) {
    assert!(std::ptr::eq(stub.recorder(operation), accessor(&stub)));
}

#[rstest]
#[case::fail_now(Operation::FailNow, "fail_now")]
#[case::errorf(Operation::Errorf, "errorf")]
#[case::temp_dir(Operation::TempDir, "temp_dir")]
fn operations_use_snake_case_names(#[case] operation: Operation, #[case] name: &str) {
    assert_eq!(operation.to_string(), name);
    assert_eq!(name.parse::<Operation>().ok(), Some(operation));
}

#[rstest]
fn every_operation_has_a_recorder() {
    assert_eq!(Operation::iter().count(), Operation::COUNT);
    assert_eq!(Operation::COUNT, 17);
    assert_eq!(Operation::iter().filter(|operation| operation.is_terminating()).count(), 3);
    assert_eq!(Operation::iter().filter(|operation| operation.is_skip()).count(), 3);
    assert!(Operation::iter().all(|operation| !(operation.is_skip() && operation.is_terminating())));
}

fn skip_with_terminating_stub(stub: &Stub) {
    stub.skip(args!["later"]);
}

fn skip_now_with_terminating_stub(stub: &Stub) {
    stub.skip_now();
}

fn skipf_with_terminating_stub(stub: &Stub) {
    stub.skipf("Format {}", args!["later"]);
}

#[rstest]
#[case::skip(Operation::Skip, skip_with_terminating_stub as fn(&Stub))]
#[case::skip_now(Operation::SkipNow, skip_now_with_terminating_stub as fn(&Stub))]
#[case::skipf(Operation::Skipf, skipf_with_terminating_stub as fn(&Stub))]
fn every_skip_operation_stops_when_enabled(#[case] operation: Operation, #[case] invoke: fn(&Stub)) {
    let stub = LifecycleStub::new(TestContext::new("terminating_skip_table")).with_terminating_skips();

    let outcome = absorb_termination(|| invoke(&stub));

    assert!(operation.is_skip());
    assert_eq!(outcome.termination().map(|t| t.operation()), Some(operation));
    assert_eq!(stub.recorder(operation).call_count(), 1);
}

#[rstest]
fn skips_stop_the_caller_when_enabled() {
    let stub = LifecycleStub::new(TestContext::new("terminating_skips")).with_terminating_skips();
    assert!(stub.terminates_on_skip());

    let outcome: Outcome<()> = absorb_termination(|| stub.skipf("Format {}", args!["reason"]));

    assert_eq!(outcome.termination().map(|t| t.operation()), Some(Operation::Skipf));
    assert!(stub.skipped());
    assert!(!stub.failed());
    assert_eq!(stub.skipf_calls().call_count(), 1);
}

#[rstest]
fn skips_return_by_default(stub: Stub) {
    assert!(!stub.terminates_on_skip());

    let outcome = absorb_termination(|| {
        stub.skip_now();
        "continued"
    });

    assert_eq!(outcome, Outcome::Finished("continued"));
}

#[rstest]
fn foreign_panics_escape_after_recording(stub: Stub) {
    let caught = panic::catch_unwind(AssertUnwindSafe(|| {
        absorb_termination::<_, ()>(|| {
            stub.log(args!["before"]);
            panic::panic_any("helper bug");
        })
    }));

    let payload = caught.expect_err("foreign panic escapes");
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"helper bug"));
    assert_eq!(stub.log_calls().call_count(), 1);
    assert!(!stub.failed());
}

#[rstest]
fn name_comes_from_the_real_harness(stub: Stub) {
    assert_eq!(stub.name(), "qmock_stub");
    assert_eq!(stub.harness().name(), "qmock_stub");
    assert_eq!(stub.name_calls().call_count(), 1);
}

#[rstest]
fn temp_dirs_belong_to_the_real_harness() {
    let context = TestContext::new("temp_dir_pass_through");
    let stub = LifecycleStub::new(&context);

    let dir = stub.temp_dir();
    assert!(dir.is_dir());
    assert_eq!(stub.temp_dir_calls().call_count(), 1);

    context.teardown();
    assert!(!dir.exists());
}

#[rstest]
fn cleanups_are_recorded_and_run_by_the_real_harness() {
    let ran = Arc::new(AtomicBool::new(false));
    let context = TestContext::new("cleanup_pass_through");
    let stub = LifecycleStub::new(&context);

    let flag = Arc::clone(&ran);
    stub.cleanup(Cleanup::new(move || flag.store(true, Ordering::SeqCst)));

    let call = stub.cleanup_calls().call(0);
    assert!(call.arg(0).is_some_and(|arg| arg.downcast_ref::<Cleanup>().is_some()));
    assert!(call.arg(0).is_some_and(|arg| !arg.is_comparable()));
    assert_eq!(call.verify_arg(0, Cleanup::new(|| {})), Ok(()));
    assert!(!ran.load(Ordering::SeqCst));

    context.teardown();
    assert!(ran.load(Ordering::SeqCst));
}

#[rstest]
fn shared_stub_records_calls_from_many_threads() {
    const THREADS: usize = 1000;
    let stub = Arc::new(LifecycleStub::new(TestContext::new("shared_stub")));

    thread::scope(|scope| {
        for index in 0..THREADS {
            let stub = Arc::clone(&stub);
            scope.spawn(move || {
                stub.log(args![index]);
                if index.is_multiple_of(100) {
                    stub.error(args![index]);
                }
            });
        }
    });

    assert_eq!(stub.log_calls().call_count(), THREADS);
    assert_eq!(stub.error_calls().call_count(), 10);
    assert!(stub.failed());
    assert!(
        stub.log_calls()
            .calls()
            .iter()
            .all(|call| call.arg(0).is_some_and(Arg::is_present))
    );
}

#[rstest]
fn stub_can_be_used_through_the_trait_object(stub: Stub) {
    fn report(t: &dyn TestLifecycle) {
        t.helper();
        t.errorf("expected {}, got {}", args![1, 2]);
    }

    report(&stub);

    assert_eq!(stub.helper_calls().call_count(), 1);
    assert_eq!(
        stub.errorf_calls().call(0).verify_args(&args!["expected {}, got {}", 1, 2]),
        Ok(())
    );
}
