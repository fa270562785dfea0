//! Backend selection
//!
//! Resolves a [`BackendPreference`] to exactly one [`ConcreteBackend`] that
//! the device supports. Auto-resolution walks a fixed priority ladder gated
//! on total device memory and is a pure function of its inputs.

use domain::{BackendPreference, BackendSet, ConcreteBackend};
use tracing::{debug, instrument};

use crate::config::SelectionPolicy;
use crate::error::EngineError;

/// Picks the concrete backend a session binds to
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendSelector {
    policy: SelectionPolicy,
}

impl BackendSelector {
    /// Create a new backend selector
    pub const fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    /// Resolve `preference` against the device's supported set
    ///
    /// A concrete preference must be a member of `supported`; otherwise the
    /// call fails with `UnsupportedBackend` naming the rejected backend.
    #[instrument(skip(self, supported), fields(supported = %supported))]
    pub fn resolve(
        &self,
        preference: BackendPreference,
        supported: &BackendSet,
        memory_mb: u64,
    ) -> Result<ConcreteBackend, EngineError> {
        match preference {
            BackendPreference::Concrete(backend) => {
                if supported.contains(backend) {
                    Ok(backend)
                } else {
                    Err(EngineError::UnsupportedBackend { backend })
                }
            },
            BackendPreference::Auto => Ok(self.auto_select(supported, memory_mb)),
        }
    }

    /// Walk the priority ladder
    ///
    /// Vendor NPU, then platform NPU, then GPU compute, then GPU render, each
    /// only if supported and `memory_mb` reaches its tier; CPU otherwise.
    #[must_use]
    pub fn auto_select(&self, supported: &BackendSet, memory_mb: u64) -> ConcreteBackend {
        let ladder = [
            (ConcreteBackend::NpuQtiHtp, self.policy.vendor_npu_min_mb),
            (ConcreteBackend::NpuNnapi, self.policy.npu_min_mb),
            (ConcreteBackend::GpuOpenCl, self.policy.gpu_compute_min_mb),
            (ConcreteBackend::GpuOpenGl, self.policy.gpu_render_min_mb),
        ];

        let selected = ladder
            .into_iter()
            .find(|(backend, min_mb)| supported.contains(*backend) && memory_mb >= *min_mb)
            .map_or(ConcreteBackend::Cpu, |(backend, _)| backend);

        debug!(memory_mb, backend = %selected, "Auto-resolved backend");
        selected
    }

    /// Get the selection policy
    #[must_use]
    pub const fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_set() -> BackendSet {
        BackendSet::from(ConcreteBackend::all().to_vec())
    }

    // === Concrete preference ===

    #[test]
    fn concrete_member_is_returned_unchanged() {
        let selector = BackendSelector::default();
        let set = BackendSet::baseline().with(ConcreteBackend::GpuOpenGl);
        let backend = selector
            .resolve(ConcreteBackend::GpuOpenGl.into(), &set, 1024)
            .unwrap();
        assert_eq!(backend, ConcreteBackend::GpuOpenGl);
    }

    #[test]
    fn concrete_member_ignores_memory_tiers() {
        let selector = BackendSelector::default();
        let backend = selector
            .resolve(ConcreteBackend::NpuQtiHtp.into(), &full_set(), 512)
            .unwrap();
        assert_eq!(backend, ConcreteBackend::NpuQtiHtp);
    }

    #[test]
    fn concrete_non_member_is_rejected_with_its_id() {
        let selector = BackendSelector::default();
        let err = selector
            .resolve(
                ConcreteBackend::NpuQtiHtp.into(),
                &BackendSet::baseline(),
                16_384,
            )
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::UnsupportedBackend {
                backend: ConcreteBackend::NpuQtiHtp
            }
        );
    }

    // === Auto ladder ===

    #[test]
    fn auto_prefers_vendor_npu_with_enough_memory() {
        let selector = BackendSelector::default();
        assert_eq!(selector.auto_select(&full_set(), 8192), ConcreteBackend::NpuQtiHtp);
    }

    #[test]
    fn auto_falls_to_nnapi_below_vendor_tier() {
        let selector = BackendSelector::default();
        assert_eq!(selector.auto_select(&full_set(), 4096), ConcreteBackend::NpuNnapi);
    }

    #[test]
    fn auto_falls_to_opencl_then_opengl_then_cpu() {
        let selector = BackendSelector::default();
        assert_eq!(selector.auto_select(&full_set(), 3072), ConcreteBackend::GpuOpenCl);
        assert_eq!(selector.auto_select(&full_set(), 2048), ConcreteBackend::GpuOpenGl);
        assert_eq!(selector.auto_select(&full_set(), 2047), ConcreteBackend::Cpu);
    }

    #[test]
    fn auto_skips_unsupported_rungs() {
        let selector = BackendSelector::default();
        let set = BackendSet::baseline()
            .with(ConcreteBackend::GpuOpenGl)
            .with(ConcreteBackend::GpuOpenCl);
        assert_eq!(selector.auto_select(&set, 16_384), ConcreteBackend::GpuOpenCl);
    }

    #[test]
    fn auto_on_baseline_is_always_cpu() {
        let selector = BackendSelector::default();
        assert_eq!(
            selector.auto_select(&BackendSet::baseline(), u64::MAX),
            ConcreteBackend::Cpu
        );
    }

    #[test]
    fn resolve_auto_never_fails() {
        let selector = BackendSelector::default();
        let backend = selector
            .resolve(BackendPreference::Auto, &BackendSet::baseline(), 0)
            .unwrap();
        assert_eq!(backend, ConcreteBackend::Cpu);
    }

    #[test]
    fn custom_policy_moves_tiers() {
        let selector = BackendSelector::new(SelectionPolicy {
            vendor_npu_min_mb: 12_288,
            npu_min_mb: 8192,
            gpu_compute_min_mb: 6144,
            gpu_render_min_mb: 1024,
        });
        assert_eq!(selector.auto_select(&full_set(), 8192), ConcreteBackend::NpuNnapi);
        assert_eq!(selector.auto_select(&full_set(), 1024), ConcreteBackend::GpuOpenGl);
    }
}
