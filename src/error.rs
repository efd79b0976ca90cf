//! Error handling module for tablerescue
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Executors and workflows never catch these; they bubble up to the process
//! selector, which is the single place that decides whether to clean up,
//! return to the menu or end the session.

use thiserror::Error;

use crate::operation::CheckValue;

/// Main error type for tablerescue
#[derive(Error, Debug)]
pub enum RescueError {
    /// Bad or missing configuration or operator input, detected before any mutation
    #[error("Validation error: {0}")]
    Validation(String),

    /// A post-condition check returned something other than the expected value
    #[error("Verification failed for '{operation}': expected {expected}, got {actual}")]
    VerificationMismatch {
        operation: String,
        expected: bool,
        actual: CheckValue,
    },

    /// The table store or backup vault call itself failed
    #[error("{action} failed: {message}")]
    ExternalAction { action: String, message: String },

    /// A poll exceeded its budget and the operator chose to stop waiting
    #[error("Timed out after {waited_secs}s waiting for {waiting_for}")]
    TimeoutExceeded { waiting_for: String, waited_secs: u64 },

    /// Explicit `exit`, end of input, or Ctrl-C
    #[error("Aborted by operator")]
    OperatorAbort,

    /// `menu` typed at a prompt
    #[error("Returned to menu")]
    ReturnToMenu,

    /// Operator answered no at a destructive-action gate
    #[error("Declined: {what}")]
    Declined { what: String },

    /// Internal invariant violation (step ordering, malformed record)
    #[error("State error: {0}")]
    State(String),

    /// IO errors (console, journal files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for tablerescue operations
pub type Result<T> = std::result::Result<T, RescueError>;

// Convenient error constructors
impl RescueError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an external action failure
    pub fn external(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalAction {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Create a declined-gate error
    pub fn declined(what: impl Into<String>) -> Self {
        Self::Declined { what: what.into() }
    }

    /// Create a state error
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// True for errors that mean the operator wants to leave the current workflow
    /// rather than errors raised by the services.
    pub fn is_operator_exit(&self) -> bool {
        matches!(self, Self::OperatorAbort | Self::ReturnToMenu)
    }
}
