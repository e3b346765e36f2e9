//! State machine error type
//!
//! Returned by run state transitions; surfaces over HTTP as `409 Conflict`.

use thiserror::Error;

/// Errors that can occur during state transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot apply '{event}' in state '{from}'")]
    InvalidTransition { from: String, event: String },

    #[error("Terminal state: '{0}' cannot transition")]
    TerminalState(String),
}

impl From<StateError> for crate::Error {
    fn from(err: StateError) -> Self {
        crate::Error::Conflict(err.to_string())
    }
}
