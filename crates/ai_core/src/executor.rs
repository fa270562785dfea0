//! Inference execution
//!
//! Validates image bytes, invokes the native runtime on the bound handle and
//! normalizes its pixel-space output. Latency is measured here so callers
//! never need their own wall-clock instrumentation.

use std::sync::Arc;
use std::time::Instant;

use domain::BoundingBox;
use tracing::{debug, trace, warn};

use crate::error::{EngineError, InferenceError};
use crate::ports::{NativeHandle, NativeRuntime, RawInference};

/// One detection with its box normalized to the unit square
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bounding_box: BoundingBox,
}

/// Normalized output of one native call
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutput {
    pub detections: Vec<Detection>,
    /// Wall-clock latency of the native call
    pub processing_time_ms: u64,
    /// Working memory reported by the runtime, if any
    pub memory_bytes: Option<u64>,
}

/// Runs validated images through the native runtime
#[derive(Clone)]
pub struct InferenceExecutor {
    runtime: Arc<dyn NativeRuntime>,
}

impl std::fmt::Debug for InferenceExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceExecutor").finish_non_exhaustive()
    }
}

impl InferenceExecutor {
    pub fn new(runtime: Arc<dyn NativeRuntime>) -> Self {
        Self { runtime }
    }

    /// Reject inputs the native runtime must never see
    ///
    /// Empty and all-zero buffers fail with distinct variants so callers can
    /// tell "nothing captured" from "capture produced garbage".
    pub fn validate_input(image: &[u8]) -> Result<(), InferenceError> {
        if image.is_empty() {
            return Err(InferenceError::EmptyInput);
        }
        if image.iter().all(|&b| b == 0) {
            return Err(InferenceError::CorruptedInput);
        }
        Ok(())
    }

    /// Run one inference on `handle`
    ///
    /// The caller must hold exclusive access to `handle` for the duration.
    pub async fn execute(
        &self,
        handle: &NativeHandle,
        image: &[u8],
    ) -> Result<ExecutionOutput, EngineError> {
        Self::validate_input(image)?;

        trace!(handle = handle.id(), bytes = image.len(), "Invoking native runtime");
        let started = Instant::now();
        let raw = self.runtime.infer(handle, image).await.map_err(|e| {
            warn!(error = %e, backend = %handle.backend(), "Native inference failed");
            InferenceError::Runtime(e.to_string())
        })?;
        let processing_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let output = normalize(raw, processing_time_ms);
        debug!(
            detections = output.detections.len(),
            processing_time_ms, "Native inference complete"
        );
        Ok(output)
    }
}

fn normalize(raw: RawInference, processing_time_ms: u64) -> ExecutionOutput {
    let RawInference {
        detections,
        image_width,
        image_height,
        memory_bytes,
    } = raw;

    let detections = detections
        .into_iter()
        .filter(|d| d.confidence.is_finite())
        .map(|d| {
            let bounding_box = BoundingBox::from_pixels(
                d.left,
                d.top,
                d.width,
                d.height,
                image_width,
                image_height,
                d.confidence,
            );
            Detection {
                label: d.label,
                confidence: bounding_box.confidence(),
                bounding_box,
            }
        })
        .collect();

    ExecutionOutput {
        detections,
        processing_time_ms,
        memory_bytes,
    }
}
