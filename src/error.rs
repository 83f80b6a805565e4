use thiserror::Error;

use crate::core::coin_selection::SelectionError;
use crate::core::emulator::{InvariantViolation, StateError, ValidationError};

/// Crate-level error. Each variant wraps the structured error of the module that raised it,
/// so callers can match on the kind instead of the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmulatorError {
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    #[error("State error: {0}")]
    State(StateError),

    #[error("Selection error: {0}")]
    Selection(SelectionError),

    #[error("Invariant violation: {0}")]
    Invariant(InvariantViolation),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

pub type Result<T> = std::result::Result<T, EmulatorError>;

impl From<serde_json::Error> for EmulatorError {
    fn from(err: serde_json::Error) -> Self {
        EmulatorError::Encoding(err.to_string())
    }
}
