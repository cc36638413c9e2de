//! Tuning error types
//!
//! The simulation itself never fails; only loading and validating tuning can.

use thiserror::Error;

/// Errors raised while loading or validating a [`crate::Tuning`].
#[derive(Error, Debug)]
pub enum TuningError {
    /// Tuning file could not be read.
    #[error("failed to read tuning: {0}")]
    Io(#[from] std::io::Error),

    /// Tuning JSON was malformed.
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its allowed range.
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl TuningError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
