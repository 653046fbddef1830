//! Mandate domain errors

use thiserror::Error;

/// Errors that can occur in the mandate domain
#[derive(Debug, Error)]
pub enum MandateError {
    /// Mandate failed its own validity rules
    #[error("Mandate validation failed: {0}")]
    ValidationFailed(String),

    /// The mandate has no primary document attached
    #[error("Mandate {0} has no mandate document")]
    MissingDocument(String),

    /// Invalid lifecycle transition
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: String,
        to: String,
    },
}

impl MandateError {
    /// Creates a ValidationFailed error from validation errors
    pub fn validation_failed(errors: Vec<String>) -> Self {
        MandateError::ValidationFailed(errors.join("; "))
    }
}
