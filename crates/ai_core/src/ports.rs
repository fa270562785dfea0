//! Port definitions for the engine's collaborators
//!
//! Three collaborators sit outside the engine: the device capability
//! provider, the model artifact loader, and the native per-backend runtime.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use domain::ConcreteBackend;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::EngineError;

/// Point-in-time reads of device state
///
/// Every method is a synchronous read; the engine calls them at the moment
/// it needs the value and never caches memory or temperature between calls.
pub trait DeviceCapabilities: Send + Sync {
    /// Platform API level
    fn api_level(&self) -> u32;

    /// Chipset or board identifier
    fn board(&self) -> String;

    /// Total physical memory in MiB
    fn total_memory_mb(&self) -> u64;

    /// Memory currently available to the process in MiB
    fn available_memory_mb(&self) -> u64;

    /// Current device temperature in degrees Celsius
    fn temperature_celsius(&self) -> f32;
}

/// A model file that passed existence and integrity checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Hex digest of the file contents
    pub digest: String,
}

/// Loads and validates model artifacts
///
/// Implementations return `EngineError::ModelLoad` for missing or corrupt
/// files and `EngineError::Initialization` for environment failures such as
/// denied permissions.
pub trait ModelLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<ModelArtifact, EngineError>;
}

/// Opaque reference to a model loaded into a native backend
///
/// Deliberately not `Clone`: exactly one owner may release it.
#[derive(Debug, PartialEq, Eq)]
pub struct NativeHandle {
    id: u64,
    backend: ConcreteBackend,
}

impl NativeHandle {
    pub const fn new(id: u64, backend: ConcreteBackend) -> Self {
        Self { id, backend }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub const fn backend(&self) -> ConcreteBackend {
        self.backend
    }
}

/// One detection as reported by the native runtime, in pixel space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Model class label, e.g. `no_hard_hat`
    pub label: String,
    pub confidence: f32,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Output of one native inference call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RawInference {
    pub detections: Vec<RawDetection>,
    /// Decoded image width in pixels
    pub image_width: u32,
    /// Decoded image height in pixels
    pub image_height: u32,
    /// Peak working memory reported by the runtime, if it tracks it
    #[serde(default)]
    pub memory_bytes: Option<u64>,
}

/// Failures reported by the native runtime
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuntimeError {
    /// The runtime could not parse or accept the model
    #[error("model rejected by runtime: {0}")]
    ModelRejected(String),

    /// The backend could not be brought up (driver, delegate, permissions)
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Execution failed
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

/// The native multi-backend inference runtime, invoked per backend
#[async_trait]
pub trait NativeRuntime: Send + Sync {
    /// Load `artifact` onto `backend`
    async fn load(
        &self,
        artifact: &ModelArtifact,
        backend: ConcreteBackend,
    ) -> Result<NativeHandle, RuntimeError>;

    /// Run one inference; the caller guarantees exclusive use of `handle`
    async fn infer(&self, handle: &NativeHandle, image: &[u8])
    -> Result<RawInference, RuntimeError>;

    /// Release native resources held by `handle`
    async fn release(&self, handle: NativeHandle);
}
