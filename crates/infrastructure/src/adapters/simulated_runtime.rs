//! Deterministic stand-in for the native inference runtime
//!
//! Detections are derived from the BLAKE3 hash of the image bytes, so the
//! same image always yields the same detections on every backend. Latency
//! scales with how specialized the backend is.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use ai_core::{
    ModelArtifact, NativeHandle, NativeRuntime, RawDetection, RawInference, RuntimeError,
};
use async_trait::async_trait;
use domain::ConcreteBackend;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Labels the simulated model can emit
const SIMULATED_LABELS: &[&str] = &[
    "person",
    "hard_hat",
    "no_hard_hat",
    "safety_vest",
    "no_safety_vest",
    "excavator",
    "crane",
    "truck",
    "fall_hazard",
    "electrical_hazard",
    "safety_cone",
    "no_safety_glasses",
    "gloves",
    "no_harness",
];

/// Simulated frame size in pixels
pub const SIMULATED_WIDTH: u32 = 640;
pub const SIMULATED_HEIGHT: u32 = 480;

/// Tunables for the simulated runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedRuntimeConfig {
    /// Latency of one CPU inference; faster backends divide it
    #[serde(default = "default_cpu_latency_ms")]
    pub cpu_latency_ms: u64,

    /// Most detections emitted per image
    #[serde(default = "default_max_detections")]
    pub max_detections: usize,

    /// Backends that fail to come up at load time
    #[serde(default)]
    pub unavailable: Vec<ConcreteBackend>,
}

const fn default_cpu_latency_ms() -> u64 {
    120
}

const fn default_max_detections() -> usize {
    6
}

impl Default for SimulatedRuntimeConfig {
    fn default() -> Self {
        Self {
            cpu_latency_ms: default_cpu_latency_ms(),
            max_detections: default_max_detections(),
            unavailable: Vec::new(),
        }
    }
}

/// Relative speed of each backend against CPU
const fn speedup(backend: ConcreteBackend) -> u64 {
    match backend {
        ConcreteBackend::Cpu => 1,
        ConcreteBackend::GpuOpenGl => 2,
        ConcreteBackend::GpuOpenCl => 3,
        ConcreteBackend::NpuNnapi => 4,
        ConcreteBackend::NpuQtiHtp => 6,
    }
}

/// In-process runtime producing hash-derived detections
#[derive(Debug)]
pub struct SimulatedRuntime {
    config: SimulatedRuntimeConfig,
    next_id: AtomicU64,
    loaded: Mutex<HashSet<u64>>,
}

impl Default for SimulatedRuntime {
    fn default() -> Self {
        Self::new(SimulatedRuntimeConfig::default())
    }
}

impl SimulatedRuntime {
    pub fn new(config: SimulatedRuntimeConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1),
            loaded: Mutex::new(HashSet::new()),
        }
    }

    /// Handles currently loaded and not yet released
    pub fn loaded_count(&self) -> usize {
        self.loaded.lock().len()
    }

    /// Simulated latency for one inference on `backend`
    pub const fn latency(&self, backend: ConcreteBackend) -> Duration {
        Duration::from_millis(self.config.cpu_latency_ms / speedup(backend))
    }

    /// Detections the simulated model reports for `image`
    pub fn detections_for(&self, image: &[u8]) -> Vec<RawDetection> {
        let mut reader = HashStream::new(image);
        let count = usize::from(reader.next_byte()) % self.config.max_detections.saturating_add(1);

        (0..count)
            .map(|_| {
                let index = usize::from(reader.next_byte()) % SIMULATED_LABELS.len();
                let label = SIMULATED_LABELS[index];
                let confidence = 0.7f32.mul_add(reader.unit(), 0.3).min(1.0);
                let width = (0.1 + 0.4 * reader.unit()) * SIMULATED_WIDTH as f32;
                let height = (0.1 + 0.5 * reader.unit()) * SIMULATED_HEIGHT as f32;
                let left = reader.unit() * (SIMULATED_WIDTH as f32 - width);
                let top = reader.unit() * (SIMULATED_HEIGHT as f32 - height);
                RawDetection {
                    label: label.to_string(),
                    confidence,
                    left,
                    top,
                    width,
                    height,
                }
            })
            .collect()
    }
}

#[async_trait]
impl NativeRuntime for SimulatedRuntime {
    async fn load(
        &self,
        artifact: &ModelArtifact,
        backend: ConcreteBackend,
    ) -> Result<NativeHandle, RuntimeError> {
        if artifact.size_bytes == 0 {
            return Err(RuntimeError::ModelRejected("model has no content".to_string()));
        }
        if self.config.unavailable.contains(&backend) {
            return Err(RuntimeError::BackendUnavailable(format!(
                "{backend} delegate is not available"
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.loaded.lock().insert(id);
        debug!(handle = id, %backend, digest = %artifact.digest, "Simulated model loaded");
        Ok(NativeHandle::new(id, backend))
    }

    async fn infer(
        &self,
        handle: &NativeHandle,
        image: &[u8],
    ) -> Result<RawInference, RuntimeError> {
        if !self.loaded.lock().contains(&handle.id()) {
            return Err(RuntimeError::ExecutionFailed(format!(
                "handle {} is not loaded",
                handle.id()
            )));
        }

        tokio::time::sleep(self.latency(handle.backend())).await;
        let detections = self.detections_for(image);
        trace!(handle = handle.id(), detections = detections.len(), "Simulated inference");

        Ok(RawInference {
            detections,
            image_width: SIMULATED_WIDTH,
            image_height: SIMULATED_HEIGHT,
            // Decoded RGB frame
            memory_bytes: Some(u64::from(SIMULATED_WIDTH * SIMULATED_HEIGHT * 3)),
        })
    }

    async fn release(&self, handle: NativeHandle) {
        if self.loaded.lock().remove(&handle.id()) {
            debug!(handle = handle.id(), "Simulated model released");
        }
    }
}

/// Endless byte stream from a BLAKE3 extendable output
struct HashStream {
    reader: blake3::OutputReader,
}

impl HashStream {
    fn new(seed: &[u8]) -> Self {
        Self {
            reader: blake3::Hasher::new().update(seed).finalize_xof(),
        }
    }

    fn next_byte(&mut self) -> u8 {
        let mut byte = [0u8; 1];
        self.reader.fill(&mut byte);
        byte[0]
    }

    /// Uniform value in `[0, 1]`
    fn unit(&mut self) -> f32 {
        let mut bytes = [0u8; 2];
        self.reader.fill(&mut bytes);
        f32::from(u16::from_le_bytes(bytes)) / f32::from(u16::MAX)
    }
}
