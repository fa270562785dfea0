//! Device capability profiling
//!
//! Turns raw device facts into the set of backends a session may bind to.

use domain::{BackendSet, ConcreteBackend, DeviceProfile};
use tracing::debug;

use crate::config::ProfilerPolicy;
use crate::ports::DeviceCapabilities;

/// Derives [`DeviceProfile`]s and their supported [`BackendSet`]s
#[derive(Debug, Clone, Default)]
pub struct DeviceProfiler {
    policy: ProfilerPolicy,
}

impl DeviceProfiler {
    /// Create a profiler with the given policy
    pub const fn new(policy: ProfilerPolicy) -> Self {
        Self { policy }
    }

    /// Read the current device facts
    pub fn profile(&self, capabilities: &dyn DeviceCapabilities) -> DeviceProfile {
        DeviceProfile::new(
            capabilities.api_level(),
            capabilities.board(),
            capabilities.total_memory_mb(),
            capabilities.temperature_celsius(),
        )
    }

    /// Backends the device may legally use
    ///
    /// CPU and GPU-render are always present. GPU-compute and the platform
    /// NPU are gated on API level; the vendor NPU on the board signature.
    #[must_use]
    pub fn supported_backends(&self, profile: &DeviceProfile) -> BackendSet {
        let mut set = BackendSet::baseline().with(ConcreteBackend::GpuOpenGl);

        if profile.api_level >= self.policy.gpu_compute_min_api {
            set.insert(ConcreteBackend::GpuOpenCl);
        }
        if profile.api_level >= self.policy.npu_min_api {
            set.insert(ConcreteBackend::NpuNnapi);
        }
        if profile.board_matches(&self.policy.vendor_npu_signatures) {
            set.insert(ConcreteBackend::NpuQtiHtp);
        }

        debug!(
            api_level = profile.api_level,
            board = %profile.board,
            backends = %set,
            "Derived supported backends"
        );
        set
    }

    pub const fn policy(&self) -> &ProfilerPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(api_level: u32, board: &str) -> DeviceProfile {
        DeviceProfile::new(api_level, board, 8192, 30.0)
    }

    #[test]
    fn old_device_gets_cpu_and_render_only() {
        let set = DeviceProfiler::default().supported_backends(&profile(21, "mt6735"));
        let backends: Vec<_> = set.iter().collect();
        assert_eq!(backends, vec![ConcreteBackend::Cpu, ConcreteBackend::GpuOpenGl]);
    }

    #[test]
    fn compute_threshold_adds_opencl() {
        let set = DeviceProfiler::default().supported_backends(&profile(24, "exynos7420"));
        assert!(set.contains(ConcreteBackend::GpuOpenCl));
        assert!(!set.contains(ConcreteBackend::NpuNnapi));
    }

    #[test]
    fn neural_threshold_adds_nnapi() {
        let set = DeviceProfiler::default().supported_backends(&profile(27, "exynos9810"));
        assert!(set.contains(ConcreteBackend::NpuNnapi));
        assert!(!set.contains(ConcreteBackend::NpuQtiHtp));
    }

    #[test]
    fn vendor_signature_adds_vendor_npu() {
        let set = DeviceProfiler::default().supported_backends(&profile(34, "kalama"));
        assert!(set.contains(ConcreteBackend::NpuQtiHtp));
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn vendor_npu_does_not_depend_on_api_level() {
        let set = DeviceProfiler::default().supported_backends(&profile(23, "QCOM-msm8996"));
        assert!(set.contains(ConcreteBackend::NpuQtiHtp));
        assert!(!set.contains(ConcreteBackend::NpuNnapi));
    }

    #[test]
    fn custom_policy_is_respected() {
        let policy = ProfilerPolicy {
            gpu_compute_min_api: 30,
            npu_min_api: 31,
            vendor_npu_signatures: vec!["tensor".to_string()],
        };
        let profiler = DeviceProfiler::new(policy);
        let set = profiler.supported_backends(&profile(29, "gs101-tensor"));
        assert!(!set.contains(ConcreteBackend::GpuOpenCl));
        assert!(set.contains(ConcreteBackend::NpuQtiHtp));
    }
}
