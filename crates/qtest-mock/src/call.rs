//! A single recorded invocation and its argument verification.

use qtest_harness::{Arg, Args, IntoArg};
use time::OffsetDateTime;

use crate::error::{Side, VerifyError};

/// Arguments captured from one invocation of a stubbed operation.
#[derive(Debug, Clone)]
pub struct Call {
    timestamp: OffsetDateTime,
    args: Args,
}

impl Call {
    /// Captures `args`, stamping the call with the current UTC time.
    #[must_use]
    pub fn new(args: Args) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            args,
        }
    }

    /// Returns when the call was recorded.
    #[must_use]
    pub const fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// Returns the captured arguments in order.
    #[must_use]
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Returns the argument at `index`, if the call captured one.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Arg> {
        self.args.get(index)
    }

    /// Returns the number of captured arguments.
    #[must_use]
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Checks the argument at `index` against `expected`.
    ///
    /// Absent arguments match only absent arguments. Present arguments must
    /// share a type; when both were captured with [`Arg::value`] their values
    /// must also be equal. Opaque values match on type alone.
    ///
    /// ```
    /// use qmock::Call;
    /// use qtest_harness::args;
    ///
    /// let call = Call::new(args!["Format {}", 7]);
    /// assert!(call.verify_arg(1, 7).is_ok());
    /// assert_eq!(
    ///     call.verify_arg(1, 8).map_err(|error| error.to_string()),
    ///     Err("arg 1: expected i32 8, actual i32 7".to_owned()),
    /// );
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::UnknownArgument`] when the call captured fewer
    /// than `index + 1` arguments, otherwise the first mismatch found.
    pub fn verify_arg(&self, index: usize, expected: impl IntoArg) -> Result<(), VerifyError> {
        let actual = self
            .args
            .get(index)
            .ok_or(VerifyError::UnknownArgument { index })?;
        verify(index, &expected.into_arg(), actual)
    }

    /// Checks every captured argument against `expected`, position by position.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::CountMismatch`] when the lengths differ, before
    /// any argument is compared. Otherwise returns the first per-argument
    /// mismatch in index order.
    pub fn verify_args(&self, expected: &[Arg]) -> Result<(), VerifyError> {
        if expected.len() != self.args.len() {
            return Err(VerifyError::CountMismatch {
                expected: expected.len(),
                actual: self.args.len(),
            });
        }
        expected
            .iter()
            .zip(&self.args)
            .enumerate()
            .try_for_each(|(index, (wanted, actual))| verify(index, wanted, actual))
    }
}

fn verify(index: usize, expected: &Arg, actual: &Arg) -> Result<(), VerifyError> {
    match (expected.type_name(), actual.type_name()) {
        (None, None) => Ok(()),
        (None, Some(type_name)) => Err(VerifyError::PresenceMismatch {
            index,
            side: Side::Expected,
            type_name,
        }),
        (Some(type_name), None) => Err(VerifyError::PresenceMismatch {
            index,
            side: Side::Actual,
            type_name,
        }),
        (Some(expected_type), Some(actual_type)) => {
            if !expected.same_type(actual) {
                return Err(VerifyError::TypeMismatch {
                    index,
                    expected: expected_type,
                    actual: actual_type,
                });
            }
            match expected.value_eq(actual) {
                Some(false) => Err(VerifyError::ValueMismatch {
                    index,
                    expected_type,
                    expected: format!("{expected:?}"),
                    actual_type,
                    actual: format!("{actual:?}"),
                }),
                Some(true) | None => Ok(()),
            }
        }
    }
}
