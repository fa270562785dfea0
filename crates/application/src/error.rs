//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The image or request cannot be analyzed as given
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Device memory or temperature turned the call away
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The analyzer ran and failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// The analyzer is not set up to take requests
    #[error("Analyzer not available: {0}")]
    NotAvailable(String),

    /// External service error
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Every analyzer in the fallback chain failed
    #[error("All {attempts} analyzers failed; last error: {last_error}")]
    AllAnalyzersFailed { attempts: usize, last_error: String },

    /// Baseline storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApplicationError::ResourceExhausted(_)
                | ApplicationError::ExternalService(_)
                | ApplicationError::NotAvailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_exhaustion_is_retryable() {
        assert!(ApplicationError::ResourceExhausted("hot".into()).is_retryable());
        assert!(ApplicationError::ExternalService("timeout".into()).is_retryable());
    }

    #[test]
    fn input_problems_are_not_retryable() {
        assert!(!ApplicationError::InvalidInput("empty image data".into()).is_retryable());
        assert!(!ApplicationError::Inference("dsp fault".into()).is_retryable());
    }

    #[test]
    fn all_failed_message_names_last_error() {
        let err = ApplicationError::AllAnalyzersFailed {
            attempts: 3,
            last_error: "legacy detector crashed".into(),
        };
        assert_eq!(
            err.to_string(),
            "All 3 analyzers failed; last error: legacy detector crashed"
        );
    }

    #[test]
    fn domain_error_converts() {
        let err: ApplicationError = DomainError::UnknownWorkType("MINING".into()).into();
        assert!(matches!(err, ApplicationError::Domain(_)));
    }
}
