//! Baseline store port - Historical performance per backend

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{ConcreteBackend, PerformanceSnapshot};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// Reference performance of one backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceBaseline {
    pub backend: ConcreteBackend,
    pub average_processing_ms: f64,
    pub average_memory_mb: f64,
    /// Analyses per second
    pub throughput_per_sec: f64,
    /// Successful analyses the baseline was computed from
    pub sample_count: u64,
    pub recorded_at: DateTime<Utc>,
}

impl PerformanceBaseline {
    /// Capture a baseline from a snapshot
    ///
    /// Returns `None` when the snapshot has no bound backend or no
    /// successful analyses to average over.
    #[must_use]
    pub fn from_snapshot(snapshot: &PerformanceSnapshot) -> Option<Self> {
        let backend = snapshot.backend?;
        if snapshot.success_count == 0 {
            return None;
        }
        Some(Self {
            backend,
            average_processing_ms: snapshot.average_processing_ms,
            average_memory_mb: snapshot.average_memory_mb,
            throughput_per_sec: snapshot.throughput_per_sec(),
            sample_count: snapshot.success_count,
            recorded_at: Utc::now(),
        })
    }
}

/// Port for baseline persistence
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BaselineStore: Send + Sync {
    /// Get the stored baseline for a backend
    async fn get(&self, backend: ConcreteBackend)
    -> Result<Option<PerformanceBaseline>, ApplicationError>;

    /// Store or replace the baseline for `baseline.backend`
    async fn put(&self, baseline: PerformanceBaseline) -> Result<(), ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(success_count: u64) -> PerformanceSnapshot {
        PerformanceSnapshot {
            backend: Some(ConcreteBackend::GpuOpenCl),
            analysis_count: success_count,
            success_count,
            average_processing_ms: 50.0,
            average_memory_mb: 310.0,
            success_rate: 1.0,
            ..PerformanceSnapshot::default()
        }
    }

    #[test]
    fn baseline_from_snapshot_derives_throughput() {
        let baseline = PerformanceBaseline::from_snapshot(&snapshot(10)).unwrap();
        assert_eq!(baseline.backend, ConcreteBackend::GpuOpenCl);
        assert!((baseline.throughput_per_sec - 20.0).abs() < 1e-9);
        assert_eq!(baseline.sample_count, 10);
    }

    #[test]
    fn empty_snapshot_yields_no_baseline() {
        assert!(PerformanceBaseline::from_snapshot(&snapshot(0)).is_none());
        assert!(PerformanceBaseline::from_snapshot(&PerformanceSnapshot::default()).is_none());
    }

    #[test]
    fn baseline_serialization_roundtrip() {
        let baseline = PerformanceBaseline::from_snapshot(&snapshot(3)).unwrap();
        let json = serde_json::to_string(&baseline).unwrap();
        let parsed: PerformanceBaseline = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, baseline);
    }
}
