//! Names of the stubbed lifecycle operations.

use strum::{Display, EnumCount, EnumIter, EnumString};

/// One operation of [`TestLifecycle`](qtest_harness::TestLifecycle).
///
/// Each operation has its own [`Recorder`](crate::Recorder) on the stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumCount, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    /// `cleanup`
    Cleanup,
    /// `error`
    Error,
    /// `errorf`
    Errorf,
    /// `fail`
    Fail,
    /// `fail_now`
    FailNow,
    /// `failed`
    Failed,
    /// `fatal`
    Fatal,
    /// `fatalf`
    Fatalf,
    /// `helper`
    Helper,
    /// `log`
    Log,
    /// `logf`
    Logf,
    /// `name`
    Name,
    /// `skip`
    Skip,
    /// `skip_now`
    SkipNow,
    /// `skipf`
    Skipf,
    /// `skipped`
    Skipped,
    /// `temp_dir`
    TempDir,
}

impl Operation {
    /// Returns `true` for operations that always stop the current test.
    #[must_use]
    pub const fn is_terminating(self) -> bool {
        matches!(self, Self::FailNow | Self::Fatal | Self::Fatalf)
    }

    /// Returns `true` for operations that stop the current test when the
    /// stub was built with terminating skips.
    #[must_use]
    pub const fn is_skip(self) -> bool {
        matches!(self, Self::Skip | Self::SkipNow | Self::Skipf)
    }
}
