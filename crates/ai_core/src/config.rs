//! Configuration for the hazard analysis engine
//!
//! Every threshold and footprint here is a policy input rather than a
//! hardware fact; deployments tune them per device family.

use domain::{ConcreteBackend, DEFAULT_CONFIDENCE_THRESHOLD};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rules for deriving the supported backend set
    #[serde(default)]
    pub profiler: ProfilerPolicy,

    /// Memory tiers for auto-resolution
    #[serde(default)]
    pub selection: SelectionPolicy,

    /// Per-backend memory footprints
    #[serde(default)]
    pub memory: MemoryPolicy,

    /// Thermal admission thresholds
    #[serde(default)]
    pub thermal: ThermalPolicy,

    /// Threshold used by callers that do not supply one
    #[serde(default = "default_confidence_threshold")]
    pub default_confidence_threshold: f32,
}

const fn default_confidence_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profiler: ProfilerPolicy::default(),
            selection: SelectionPolicy::default(),
            memory: MemoryPolicy::default(),
            thermal: ThermalPolicy::default(),
            default_confidence_threshold: default_confidence_threshold(),
        }
    }
}

impl EngineConfig {
    /// Reject configurations that would make the guard or selector incoherent
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut problems = Vec::new();

        if self.thermal.warning_celsius > self.thermal.severe_celsius {
            problems.push(format!(
                "thermal.warning_celsius ({}) exceeds thermal.severe_celsius ({})",
                self.thermal.warning_celsius, self.thermal.severe_celsius
            ));
        }
        if !(self.memory.image_multiplier.is_finite() && self.memory.image_multiplier > 0.0) {
            problems.push(format!(
                "memory.image_multiplier must be positive, got {}",
                self.memory.image_multiplier
            ));
        }
        if !(0.0..=1.0).contains(&self.default_confidence_threshold) {
            problems.push(format!(
                "default_confidence_threshold must be in [0, 1], got {}",
                self.default_confidence_threshold
            ));
        }
        let tiers = &self.selection;
        if !(tiers.vendor_npu_min_mb >= tiers.npu_min_mb
            && tiers.npu_min_mb >= tiers.gpu_compute_min_mb
            && tiers.gpu_compute_min_mb >= tiers.gpu_render_min_mb)
        {
            problems.push("selection tiers must be non-increasing down the ladder".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Initialization(format!(
                "invalid engine configuration: {}",
                problems.join("; ")
            )))
        }
    }
}

/// Rules mapping device facts to the supported backend set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilerPolicy {
    /// API level from which GPU compute (OpenCL) is usable
    #[serde(default = "default_gpu_compute_min_api")]
    pub gpu_compute_min_api: u32,

    /// API level from which the platform NPU (NNAPI) is usable
    #[serde(default = "default_npu_min_api")]
    pub npu_min_api: u32,

    /// Board substrings identifying vendor-NPU chipsets
    #[serde(default = "default_vendor_npu_signatures")]
    pub vendor_npu_signatures: Vec<String>,
}

const fn default_gpu_compute_min_api() -> u32 {
    24
}

const fn default_npu_min_api() -> u32 {
    27 // NNAPI shipped with Android 8.1
}

fn default_vendor_npu_signatures() -> Vec<String> {
    [
        "qcom",
        "sm8",
        "snapdragon",
        "kona",
        "lahaina",
        "taro",
        "kalama",
        "pineapple",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ProfilerPolicy {
    fn default() -> Self {
        Self {
            gpu_compute_min_api: default_gpu_compute_min_api(),
            npu_min_api: default_npu_min_api(),
            vendor_npu_signatures: default_vendor_npu_signatures(),
        }
    }
}

/// Minimum total device memory (MiB) for each rung of the auto ladder
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SelectionPolicy {
    #[serde(default = "default_vendor_npu_min_mb")]
    pub vendor_npu_min_mb: u64,
    #[serde(default = "default_npu_min_mb")]
    pub npu_min_mb: u64,
    #[serde(default = "default_gpu_compute_min_mb")]
    pub gpu_compute_min_mb: u64,
    #[serde(default = "default_gpu_render_min_mb")]
    pub gpu_render_min_mb: u64,
}

const fn default_vendor_npu_min_mb() -> u64 {
    6144
}

const fn default_npu_min_mb() -> u64 {
    4096
}

const fn default_gpu_compute_min_mb() -> u64 {
    3072
}

const fn default_gpu_render_min_mb() -> u64 {
    2048
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            vendor_npu_min_mb: default_vendor_npu_min_mb(),
            npu_min_mb: default_npu_min_mb(),
            gpu_compute_min_mb: default_gpu_compute_min_mb(),
            gpu_render_min_mb: default_gpu_render_min_mb(),
        }
    }
}

/// Memory needed to host the model on each backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MemoryPolicy {
    #[serde(default = "default_cpu_mb")]
    pub cpu_mb: u64,
    #[serde(default = "default_gpu_opengl_mb")]
    pub gpu_opengl_mb: u64,
    #[serde(default = "default_gpu_opencl_mb")]
    pub gpu_opencl_mb: u64,
    #[serde(default = "default_npu_nnapi_mb")]
    pub npu_nnapi_mb: u64,
    #[serde(default = "default_npu_qti_htp_mb")]
    pub npu_qti_htp_mb: u64,

    /// Working memory per request as a multiple of the encoded image size
    #[serde(default = "default_image_multiplier")]
    pub image_multiplier: f64,
}

const fn default_cpu_mb() -> u64 {
    100
}

const fn default_gpu_opengl_mb() -> u64 {
    200
}

const fn default_gpu_opencl_mb() -> u64 {
    300
}

const fn default_npu_nnapi_mb() -> u64 {
    350
}

const fn default_npu_qti_htp_mb() -> u64 {
    320
}

const fn default_image_multiplier() -> f64 {
    1.5
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            cpu_mb: default_cpu_mb(),
            gpu_opengl_mb: default_gpu_opengl_mb(),
            gpu_opencl_mb: default_gpu_opencl_mb(),
            npu_nnapi_mb: default_npu_nnapi_mb(),
            npu_qti_htp_mb: default_npu_qti_htp_mb(),
            image_multiplier: default_image_multiplier(),
        }
    }
}

impl MemoryPolicy {
    /// Minimum footprint of the model on `backend`
    #[must_use]
    pub const fn footprint_mb(&self, backend: ConcreteBackend) -> u64 {
        match backend {
            ConcreteBackend::Cpu => self.cpu_mb,
            ConcreteBackend::GpuOpenGl => self.gpu_opengl_mb,
            ConcreteBackend::GpuOpenCl => self.gpu_opencl_mb,
            ConcreteBackend::NpuNnapi => self.npu_nnapi_mb,
            ConcreteBackend::NpuQtiHtp => self.npu_qti_htp_mb,
        }
    }
}

/// Thermal admission thresholds in degrees Celsius
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThermalPolicy {
    /// At or above this, calls are rejected
    #[serde(default = "default_severe_celsius")]
    pub severe_celsius: f32,

    /// At or above this, calls proceed but a warning is logged
    #[serde(default = "default_warning_celsius")]
    pub warning_celsius: f32,
}

const fn default_severe_celsius() -> f32 {
    80.0
}

const fn default_warning_celsius() -> f32 {
    70.0
}

impl Default for ThermalPolicy {
    fn default() -> Self {
        Self {
            severe_celsius: default_severe_celsius(),
            warning_celsius: default_warning_celsius(),
        }
    }
}
