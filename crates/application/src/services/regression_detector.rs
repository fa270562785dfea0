//! Performance regression detection
//!
//! Compares a session's performance snapshot with the stored baseline for
//! the same backend. Latency and memory regress when they grow past their
//! threshold; throughput regresses when it drops past its threshold.

use std::fmt;
use std::sync::Arc;

use domain::{ConcreteBackend, PerformanceSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{BaselineStore, PerformanceBaseline};

/// Allowed degradation per metric, in percent of the baseline
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegressionThresholds {
    #[serde(default = "default_latency_pct")]
    pub latency_pct: f64,
    #[serde(default = "default_memory_pct")]
    pub memory_pct: f64,
    #[serde(default = "default_throughput_pct")]
    pub throughput_pct: f64,
}

const fn default_latency_pct() -> f64 {
    15.0
}

const fn default_memory_pct() -> f64 {
    20.0
}

const fn default_throughput_pct() -> f64 {
    15.0
}

impl Default for RegressionThresholds {
    fn default() -> Self {
        Self {
            latency_pct: default_latency_pct(),
            memory_pct: default_memory_pct(),
            throughput_pct: default_throughput_pct(),
        }
    }
}

/// Compared metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Latency,
    Memory,
    Throughput,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Latency => "latency",
            Self::Memory => "memory",
            Self::Throughput => "throughput",
        })
    }
}

/// One metric compared against its baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: Metric,
    pub baseline: f64,
    pub current: f64,
    /// Degradation in percent; negative means the metric improved
    pub degradation_pct: f64,
    pub threshold_pct: f64,
    pub regressed: bool,
}

/// Outcome of comparing a snapshot with a baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionReport {
    pub backend: ConcreteBackend,
    pub comparisons: Vec<MetricComparison>,
}

impl RegressionReport {
    /// Whether any metric regressed
    #[must_use]
    pub fn regressed(&self) -> bool {
        self.comparisons.iter().any(|c| c.regressed)
    }

    /// Metrics that regressed
    pub fn regressions(&self) -> impl Iterator<Item = &MetricComparison> {
        self.comparisons.iter().filter(|c| c.regressed)
    }
}

/// Regression detector backed by a baseline store
pub struct RegressionDetector {
    store: Arc<dyn BaselineStore>,
    thresholds: RegressionThresholds,
}

impl fmt::Debug for RegressionDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegressionDetector")
            .field("thresholds", &self.thresholds)
            .finish_non_exhaustive()
    }
}

impl RegressionDetector {
    /// Create a new regression detector
    pub fn new(store: Arc<dyn BaselineStore>, thresholds: RegressionThresholds) -> Self {
        Self { store, thresholds }
    }

    /// Compare `snapshot` with `baseline`
    ///
    /// Metrics without data on either side are left out rather than
    /// reported as regressions.
    #[must_use]
    pub fn evaluate(
        &self,
        snapshot: &PerformanceSnapshot,
        baseline: &PerformanceBaseline,
    ) -> RegressionReport {
        let mut comparisons = Vec::with_capacity(3);

        if snapshot.success_count > 0 {
            if let Some(c) = compare_growth(
                Metric::Latency,
                baseline.average_processing_ms,
                snapshot.average_processing_ms,
                self.thresholds.latency_pct,
            ) {
                comparisons.push(c);
            }
            if let Some(c) = compare_growth(
                Metric::Memory,
                baseline.average_memory_mb,
                snapshot.average_memory_mb,
                self.thresholds.memory_pct,
            ) {
                comparisons.push(c);
            }
            if let Some(c) = compare_drop(
                Metric::Throughput,
                baseline.throughput_per_sec,
                snapshot.throughput_per_sec(),
                self.thresholds.throughput_pct,
            ) {
                comparisons.push(c);
            }
        }

        RegressionReport {
            backend: baseline.backend,
            comparisons,
        }
    }

    /// Compare `snapshot` with the stored baseline for `backend`
    ///
    /// Returns `Ok(None)` when no baseline has been recorded yet.
    #[instrument(skip(self, snapshot))]
    pub async fn check(
        &self,
        backend: ConcreteBackend,
        snapshot: &PerformanceSnapshot,
    ) -> Result<Option<RegressionReport>, ApplicationError> {
        let Some(baseline) = self.store.get(backend).await? else {
            debug!("No baseline recorded for backend");
            return Ok(None);
        };

        let report = self.evaluate(snapshot, &baseline);
        for regression in report.regressions() {
            warn!(
                metric = %regression.metric,
                baseline = regression.baseline,
                current = regression.current,
                degradation_pct = regression.degradation_pct,
                "Performance regression detected"
            );
        }
        Ok(Some(report))
    }

    /// Store `snapshot` as the new baseline for its backend
    ///
    /// Returns the stored baseline, or `None` if the snapshot had nothing
    /// to record.
    #[instrument(skip(self, snapshot))]
    pub async fn record_baseline(
        &self,
        snapshot: &PerformanceSnapshot,
    ) -> Result<Option<PerformanceBaseline>, ApplicationError> {
        let Some(baseline) = PerformanceBaseline::from_snapshot(snapshot) else {
            return Ok(None);
        };
        self.store.put(baseline.clone()).await?;
        info!(backend = %baseline.backend, samples = baseline.sample_count, "Baseline recorded");
        Ok(Some(baseline))
    }

    pub const fn thresholds(&self) -> &RegressionThresholds {
        &self.thresholds
    }
}

/// Higher is worse
fn compare_growth(
    metric: Metric,
    baseline: f64,
    current: f64,
    threshold_pct: f64,
) -> Option<MetricComparison> {
    if baseline <= 0.0 || !current.is_finite() {
        return None;
    }
    let degradation_pct = (current - baseline) / baseline * 100.0;
    Some(MetricComparison {
        metric,
        baseline,
        current,
        degradation_pct,
        threshold_pct,
        regressed: degradation_pct > threshold_pct,
    })
}

/// Lower is worse
fn compare_drop(
    metric: Metric,
    baseline: f64,
    current: f64,
    threshold_pct: f64,
) -> Option<MetricComparison> {
    if baseline <= 0.0 || current <= 0.0 || !current.is_finite() {
        return None;
    }
    let degradation_pct = (baseline - current) / baseline * 100.0;
    Some(MetricComparison {
        metric,
        baseline,
        current,
        degradation_pct,
        threshold_pct,
        regressed: degradation_pct > threshold_pct,
    })
}
