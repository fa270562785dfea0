//! Resource admission control
//!
//! Pure validations run before any native work: memory at initialization,
//! memory and temperature per call. The guard never touches session state;
//! the engine reads the device and hands the readings in.

use domain::ConcreteBackend;
use tracing::warn;

use crate::config::{MemoryPolicy, ThermalPolicy};
use crate::error::EngineError;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Result of a passing thermal check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermalStatus {
    /// Below the warning threshold
    Nominal,
    /// At or above the warning threshold but still admitted
    Elevated,
}

/// Memory and thermal admission checks
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceGuard {
    memory: MemoryPolicy,
    thermal: ThermalPolicy,
}

impl ResourceGuard {
    pub const fn new(memory: MemoryPolicy, thermal: ThermalPolicy) -> Self {
        Self { memory, thermal }
    }

    /// Memory needed to host the model on `backend`
    #[must_use]
    pub const fn backend_requirement_mb(&self, backend: ConcreteBackend) -> u64 {
        self.memory.footprint_mb(backend)
    }

    /// Memory needed to analyze an image of `image_len` bytes on `backend`
    ///
    /// Backend footprint plus the image working set, rounded up to whole MiB.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn call_requirement_mb(&self, backend: ConcreteBackend, image_len: usize) -> u64 {
        let working_set = (image_len as f64 * self.memory.image_multiplier / BYTES_PER_MB).ceil();
        self.backend_requirement_mb(backend) + working_set.max(0.0) as u64
    }

    /// Init-time check: can the device host the model on `backend` at all
    pub fn check_init_memory(
        &self,
        backend: ConcreteBackend,
        available_mb: u64,
    ) -> Result<u64, EngineError> {
        let required_mb = self.backend_requirement_mb(backend);
        Self::check(required_mb, available_mb)
    }

    /// Per-call check, run before the native backend is invoked
    pub fn check_call_memory(
        &self,
        backend: ConcreteBackend,
        image_len: usize,
        available_mb: u64,
    ) -> Result<u64, EngineError> {
        let required_mb = self.call_requirement_mb(backend, image_len);
        Self::check(required_mb, available_mb)
    }

    fn check(required_mb: u64, available_mb: u64) -> Result<u64, EngineError> {
        if available_mb < required_mb {
            warn!(required_mb, available_mb, "Rejecting: insufficient memory");
            Err(EngineError::out_of_memory(required_mb, available_mb))
        } else {
            Ok(required_mb)
        }
    }

    /// Per-call thermal check
    pub fn check_thermal(&self, temperature_celsius: f32) -> Result<ThermalStatus, EngineError> {
        if temperature_celsius >= self.thermal.severe_celsius {
            warn!(
                temperature_celsius,
                threshold = self.thermal.severe_celsius,
                "Rejecting: thermal throttling"
            );
            return Err(EngineError::ThermalThrottling {
                temperature_celsius,
            });
        }
        if temperature_celsius >= self.thermal.warning_celsius {
            warn!(temperature_celsius, "Device temperature elevated");
            return Ok(ThermalStatus::Elevated);
        }
        Ok(ThermalStatus::Nominal)
    }

    /// Whether a reading is at or above the rejection threshold
    #[must_use]
    pub fn is_throttling(&self, temperature_celsius: f32) -> bool {
        temperature_celsius >= self.thermal.severe_celsius
    }
}
