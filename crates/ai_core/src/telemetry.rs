//! Performance telemetry
//!
//! A lock-guarded aggregate shared by every call on a session. Callers only
//! ever see immutable [`PerformanceSnapshot`]s.

use domain::{ConcreteBackend, PerformanceSnapshot};
use parking_lot::Mutex;

use crate::guard::ThermalStatus;

#[derive(Debug, Default)]
struct Aggregate {
    backend: Option<ConcreteBackend>,
    analysis_count: u64,
    success_count: u64,
    failure_count: u64,
    rejected_count: u64,
    average_memory_mb: f64,
    peak_memory_mb: u64,
    average_processing_ms: f64,
    thermal_throttled: bool,
    thermal_elevated: bool,
}

/// Session-wide performance statistics
#[derive(Debug, Default)]
pub struct PerformanceTelemetry {
    inner: Mutex<Aggregate>,
}

impl PerformanceTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all statistics and bind them to `backend`
    pub fn reset(&self, backend: Option<ConcreteBackend>) {
        *self.inner.lock() = Aggregate {
            backend,
            ..Aggregate::default()
        };
    }

    /// A call that reached the executor and produced a result
    pub fn record_success(&self, processing_ms: u64, memory_mb: u64) {
        let mut agg = self.inner.lock();
        agg.analysis_count += 1;
        agg.success_count += 1;

        let n = agg.success_count as f64;
        agg.average_processing_ms += (processing_ms as f64 - agg.average_processing_ms) / n;
        agg.average_memory_mb += (memory_mb as f64 - agg.average_memory_mb) / n;
        agg.peak_memory_mb = agg.peak_memory_mb.max(memory_mb);
    }

    /// A call that reached the executor and failed there
    pub fn record_failure(&self) {
        let mut agg = self.inner.lock();
        agg.analysis_count += 1;
        agg.failure_count += 1;
    }

    /// A call turned away before the executor
    pub fn record_rejection(&self) {
        let mut agg = self.inner.lock();
        agg.failure_count += 1;
        agg.rejected_count += 1;
    }

    /// Track the most recent thermal state
    pub fn observe_thermal(&self, throttled: bool) {
        self.inner.lock().thermal_throttled = throttled;
    }

    /// Thermal state of the most recent call the guard admitted
    pub fn observe_admission(&self, status: ThermalStatus) {
        self.inner.lock().thermal_elevated = status == ThermalStatus::Elevated;
    }

    /// Immutable copy of the current statistics
    pub fn snapshot(&self) -> PerformanceSnapshot {
        let agg = self.inner.lock();
        let attempted = agg.success_count + agg.failure_count;
        let success_rate = if attempted == 0 {
            1.0
        } else {
            agg.success_count as f64 / attempted as f64
        };

        PerformanceSnapshot {
            backend: agg.backend,
            analysis_count: agg.analysis_count,
            success_count: agg.success_count,
            failure_count: agg.failure_count,
            rejected_count: agg.rejected_count,
            average_memory_mb: agg.average_memory_mb,
            peak_memory_mb: agg.peak_memory_mb,
            average_processing_ms: agg.average_processing_ms,
            success_rate,
            thermal_throttled: agg.thermal_throttled,
            thermal_elevated: agg.thermal_elevated,
        }
    }
}
