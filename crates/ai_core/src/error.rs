//! Engine errors

use domain::{ConcreteBackend, DomainError};
use thiserror::Error;

/// Errors returned by engine initialization and analysis
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// Model artifact missing, unreadable as a model, or failing integrity checks
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    /// Environment or permission failure while setting up the session
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// Requested backend is not in the device's supported set
    #[error("Backend not supported on this device: {backend}")]
    UnsupportedBackend { backend: ConcreteBackend },

    /// Not enough memory for the backend or the request
    #[error("Out of memory: required {required_mb} MiB, available {available_mb} MiB")]
    OutOfMemory { required_mb: u64, available_mb: u64 },

    /// Device is too hot to accept work
    #[error("Thermal throttling: device at {temperature_celsius}°C")]
    ThermalThrottling { temperature_celsius: f32 },

    /// Input validation or native inference failure
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Analysis requested on a session that is not READY
    #[error("Engine session is not ready")]
    NotReady,

    /// `initialize` called on a session that was not cleaned up
    #[error("Engine session is already initialized; call cleanup first")]
    AlreadyInitialized,
}

/// Failures at the inference executor stage
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InferenceError {
    /// Zero-length image buffer
    #[error("empty image data")]
    EmptyInput,

    /// Buffer of zero bytes only
    #[error("corrupted image data")]
    CorruptedInput,

    /// Request parameters out of range
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The native runtime reported a failure
    #[error("native runtime failure: {0}")]
    Runtime(String),
}

impl EngineError {
    /// Create an out-of-memory error
    pub const fn out_of_memory(required_mb: u64, available_mb: u64) -> Self {
        Self::OutOfMemory {
            required_mb,
            available_mb,
        }
    }

    /// Whether this error can only come from `initialize`
    pub const fn is_initialization_failure(&self) -> bool {
        matches!(
            self,
            Self::ModelLoad(_)
                | Self::Initialization(_)
                | Self::UnsupportedBackend { .. }
                | Self::AlreadyInitialized
        )
    }

    /// Whether the same call may succeed later without caller changes
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::OutOfMemory { .. }
                | Self::ThermalThrottling { .. }
                | Self::Inference(InferenceError::Runtime(_))
        )
    }

    /// Whether re-capturing the image may help
    pub const fn is_input_problem(&self) -> bool {
        matches!(
            self,
            Self::Inference(InferenceError::EmptyInput | InferenceError::CorruptedInput)
        )
    }
}

impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        Self::Inference(InferenceError::InvalidRequest(err.to_string()))
    }
}
