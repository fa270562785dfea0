//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    /// Unknown backend identifier
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    /// Unknown work type identifier
    #[error("Unknown work type: {0}")]
    UnknownWorkType(String),

    /// Confidence value outside [0, 1]
    #[error("Invalid confidence: {0} (must be between 0 and 1)")]
    InvalidConfidence(f32),

    /// Bounding box coordinates outside the unit square
    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl DomainError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}
