//! Verification failures reported by [`Call`](crate::Call).

use thiserror::Error;

/// The side of a comparison that held no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The expected argument was absent.
    Expected,
    /// The recorded argument was absent.
    Actual,
}

/// Reasons a recorded call did not match the expected arguments.
///
/// Verification never panics; every mismatch is returned as one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// The call recorded fewer arguments than the requested index.
    #[error("unknown arg: index {index}")]
    UnknownArgument {
        /// Requested argument index.
        index: usize,
    },

    /// One side held a value and the other did not.
    #[error("arg {index}: {}", .side.describe(.type_name))]
    PresenceMismatch {
        /// Argument index.
        index: usize,
        /// Side that held no value.
        side: Side,
        /// Type of the value on the other side.
        type_name: String,
    },

    /// Both sides held values of different types.
    #[error("arg {index}: expected type {expected}, actual type {actual}")]
    TypeMismatch {
        /// Argument index.
        index: usize,
        /// Type of the expected value.
        expected: String,
        /// Type of the recorded value.
        actual: String,
    },

    /// Both sides held comparable values of the same type that differ.
    #[error("arg {index}: expected {expected_type} {expected}, actual {actual_type} {actual}")]
    ValueMismatch {
        /// Argument index.
        index: usize,
        /// Type of the expected value.
        expected_type: String,
        /// Expected value, formatted with `Debug`.
        expected: String,
        /// Type of the recorded value.
        actual_type: String,
        /// Recorded value, formatted with `Debug`.
        actual: String,
    },

    /// The number of expected arguments differs from the number recorded.
    #[error("different arg counts: expected {expected}, actual {actual}")]
    CountMismatch {
        /// Number of expected arguments.
        expected: usize,
        /// Number of recorded arguments.
        actual: usize,
    },
}

impl VerifyError {
    /// Returns the argument index the failure refers to, if any.
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        match self {
            Self::UnknownArgument { index }
            | Self::PresenceMismatch { index, .. }
            | Self::TypeMismatch { index, .. }
            | Self::ValueMismatch { index, .. } => Some(*index),
            Self::CountMismatch { .. } => None,
        }
    }
}

impl Side {
    fn describe(self, type_name: &str) -> String {
        match self {
            Self::Expected => format!("expected absent, actual {type_name} present"),
            Self::Actual => format!("expected {type_name} present, actual absent"),
        }
    }
}
