//! Performance snapshot entity

use serde::{Deserialize, Serialize};

use crate::value_objects::ConcreteBackend;

/// Immutable view of a session's accumulated performance statistics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    /// Backend the session was bound to when the snapshot was taken
    pub backend: Option<ConcreteBackend>,
    /// Calls that reached the inference executor
    pub analysis_count: u64,
    /// Calls that produced a result
    pub success_count: u64,
    /// Calls that failed, including guard rejections
    pub failure_count: u64,
    /// Calls rejected by the resource guard before execution
    pub rejected_count: u64,
    pub average_memory_mb: f64,
    pub peak_memory_mb: u64,
    pub average_processing_ms: f64,
    /// Successes over all attempted calls, 1.0 before the first call
    pub success_rate: f64,
    /// Whether the last thermal reading was at or above the severe threshold
    pub thermal_throttled: bool,
    /// Whether the last admitted call ran at or above the warning threshold
    #[serde(default)]
    pub thermal_elevated: bool,
}

impl PerformanceSnapshot {
    /// Total calls seen by the session
    #[must_use]
    pub const fn total_calls(&self) -> u64 {
        self.success_count + self.failure_count
    }

    /// Analyses per second implied by the average processing time
    #[must_use]
    pub fn throughput_per_sec(&self) -> f64 {
        if self.average_processing_ms > 0.0 {
            1000.0 / self.average_processing_ms
        } else {
            0.0
        }
    }
}
