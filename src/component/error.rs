//! Component error taxonomy.

use thiserror::Error;

/// Errors surfaced by the LLM component lifecycle.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// The native handle was never created (FFI callers passing null).
    #[error("Component not initialized")]
    NotInitialized,

    /// Malformed input, a caller bug (e.g. empty path).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is invalid in the component's current state.
    #[error("Invalid state for {operation}: {reason}")]
    InvalidState {
        operation: &'static str,
        reason: String,
    },

    /// The native load call failed; carries the backend diagnostic.
    #[error("Model load failed: {0}")]
    ModelLoadFailed(String),
}

impl ComponentError {
    pub(crate) fn invalid_state(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidState { operation, reason: reason.into() }
    }
}
