//! Fallback orchestration across analyzers
//!
//! Picks an ordered chain of analyzers from the feature flags and the
//! rollout bucket of a stable identifier, then tries each one once. The
//! on-device engine never retries internally; this is the only place where
//! a failed analysis leads to another attempt, and that attempt always goes
//! to a different analyzer.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use domain::{AnalysisRequest, AnalysisResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::rollout;
use crate::error::ApplicationError;
use crate::ports::{AnalyzerKind, HazardAnalyzerPort};

/// Rollout key for the on-device engine
pub const ON_DEVICE_FEATURE_KEY: &str = "on_device_analysis";

/// Switches controlling analyzer selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Whether the on-device engine may be used at all
    #[serde(default = "default_true")]
    pub on_device_enabled: bool,

    /// Whether the cloud analyzer may be used
    #[serde(default)]
    pub cloud_enabled: bool,

    /// Share of identifiers (0-100) routed to the on-device engine
    #[serde(default = "default_rollout_percentage")]
    pub rollout_percentage: u8,

    /// Force the legacy detector regardless of every other flag
    #[serde(default)]
    pub emergency_rollback: bool,
}

const fn default_true() -> bool {
    true
}

const fn default_rollout_percentage() -> u8 {
    100
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            on_device_enabled: default_true(),
            cloud_enabled: false,
            rollout_percentage: default_rollout_percentage(),
            emergency_rollback: false,
        }
    }
}

impl FeatureFlags {
    /// Ordered analyzer chain for `stable_id`
    ///
    /// Emergency rollback yields the legacy detector alone. Otherwise the
    /// on-device engine leads when enabled and inside the rollout, the cloud
    /// analyzer follows when enabled, and the legacy detector always closes
    /// the chain.
    #[must_use]
    pub fn chain_for(&self, stable_id: &str) -> Vec<AnalyzerKind> {
        if self.emergency_rollback {
            return vec![AnalyzerKind::Legacy];
        }

        let mut chain = Vec::with_capacity(3);
        if self.on_device_enabled
            && rollout::is_enabled(ON_DEVICE_FEATURE_KEY, stable_id, self.rollout_percentage)
        {
            chain.push(AnalyzerKind::OnDevice);
        }
        if self.cloud_enabled {
            chain.push(AnalyzerKind::Cloud);
        }
        chain.push(AnalyzerKind::Legacy);
        chain
    }
}

/// A failed attempt inside the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    pub analyzer: AnalyzerKind,
    pub error: String,
}

/// Successful outcome with provenance
#[derive(Debug, Clone)]
pub struct FallbackOutcome {
    pub result: AnalysisResult,
    /// Analyzer that produced `result`
    pub analyzer: AnalyzerKind,
    /// Analyzers that failed before it, in order
    pub failed: Vec<FailedAttempt>,
}

impl FallbackOutcome {
    /// Whether the first analyzer in the chain failed
    #[must_use]
    pub fn fell_back(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Orchestrates analysis across the registered analyzers
pub struct FallbackOrchestrator {
    analyzers: HashMap<AnalyzerKind, Arc<dyn HazardAnalyzerPort>>,
    flags: RwLock<FeatureFlags>,
}

impl fmt::Debug for FallbackOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered: Vec<_> = self.analyzers.keys().map(AnalyzerKind::as_str).collect();
        registered.sort_unstable();
        f.debug_struct("FallbackOrchestrator")
            .field("analyzers", &registered)
            .field("flags", &*self.flags.read())
            .finish()
    }
}

impl FallbackOrchestrator {
    /// Create an orchestrator with the given flags and no analyzers
    pub fn new(flags: FeatureFlags) -> Self {
        Self {
            analyzers: HashMap::new(),
            flags: RwLock::new(flags),
        }
    }

    /// Register an analyzer under its own kind, replacing any previous one
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: Arc<dyn HazardAnalyzerPort>) -> Self {
        self.analyzers.insert(analyzer.kind(), analyzer);
        self
    }

    /// Replace the feature flags; affects subsequent calls only
    pub fn update_flags(&self, flags: FeatureFlags) {
        info!(
            emergency_rollback = flags.emergency_rollback,
            rollout_percentage = flags.rollout_percentage,
            "Feature flags updated"
        );
        *self.flags.write() = flags;
    }

    pub fn flags(&self) -> FeatureFlags {
        self.flags.read().clone()
    }

    /// Registered analyzers `stable_id` would be routed through, in order
    pub fn plan(&self, stable_id: &str) -> Vec<AnalyzerKind> {
        self.flags
            .read()
            .chain_for(stable_id)
            .into_iter()
            .filter(|kind| self.analyzers.contains_key(kind))
            .collect()
    }

    /// Analyze `request`, trying each analyzer in the chain once
    #[instrument(skip(self, request), fields(work_type = %request.work_type))]
    pub async fn analyze(
        &self,
        stable_id: &str,
        request: &AnalysisRequest,
    ) -> Result<FallbackOutcome, ApplicationError> {
        let plan = self.plan(stable_id);
        if plan.is_empty() {
            return Err(ApplicationError::NotAvailable(
                "no registered analyzer is enabled".to_string(),
            ));
        }
        debug!(chain = ?plan, "Analyzer chain selected");

        let mut failed = Vec::new();
        for kind in plan {
            let Some(analyzer) = self.analyzers.get(&kind) else {
                continue;
            };
            match analyzer.analyze(request).await {
                Ok(result) => {
                    if !failed.is_empty() {
                        info!(analyzer = %kind, failed = failed.len(), "Fell back to analyzer");
                    }
                    return Ok(FallbackOutcome {
                        result,
                        analyzer: kind,
                        failed,
                    });
                },
                Err(e) => {
                    warn!(analyzer = %kind, error = %e, "Analyzer failed");
                    failed.push(FailedAttempt {
                        analyzer: kind,
                        error: e.to_string(),
                    });
                },
            }
        }

        let attempts = failed.len();
        let last_error = failed
            .pop()
            .map_or_else(|| "no analyzer ran".to_string(), |f| f.error);
        Err(ApplicationError::AllAnalyzersFailed {
            attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockHazardAnalyzerPort;
    use domain::{ConcreteBackend, PpeMap, RiskAssessment, Severity, WorkType};

    fn result(backend: ConcreteBackend) -> AnalysisResult {
        AnalysisResult {
            hazards: Vec::new(),
            ppe: PpeMap::new(),
            violations: Vec::new(),
            risk: RiskAssessment {
                overall: Severity::Low,
                score: 10,
                recommendations: vec!["ok".to_string()],
            },
            confidence: 0.0,
            processing_time_ms: 12,
            backend,
        }
    }

    fn analyzer(
        kind: AnalyzerKind,
        outcome: Result<(), &'static str>,
    ) -> Arc<dyn HazardAnalyzerPort> {
        let mut mock = MockHazardAnalyzerPort::new();
        mock.expect_kind().return_const(kind);
        match outcome {
            Ok(()) => {
                mock.expect_analyze()
                    .times(1)
                    .returning(|_| Ok(result(ConcreteBackend::Cpu)));
            },
            Err(msg) => {
                mock.expect_analyze()
                    .times(1)
                    .returning(move |_| Err(ApplicationError::Inference(msg.to_string())));
            },
        }
        Arc::new(mock)
    }

    fn unused(kind: AnalyzerKind) -> Arc<dyn HazardAnalyzerPort> {
        let mut mock = MockHazardAnalyzerPort::new();
        mock.expect_kind().return_const(kind);
        mock.expect_analyze().times(0);
        Arc::new(mock)
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(vec![1, 2, 3], WorkType::GeneralConstruction)
    }

    // === Chain selection ===

    #[test]
    fn default_flags_route_to_on_device_then_legacy() {
        let chain = FeatureFlags::default().chain_for("device-1");
        assert_eq!(chain, vec![AnalyzerKind::OnDevice, AnalyzerKind::Legacy]);
    }

    #[test]
    fn emergency_rollback_forces_legacy_only() {
        let flags = FeatureFlags {
            cloud_enabled: true,
            emergency_rollback: true,
            ..FeatureFlags::default()
        };
        assert_eq!(flags.chain_for("device-1"), vec![AnalyzerKind::Legacy]);
    }

    #[test]
    fn zero_rollout_skips_on_device() {
        let flags = FeatureFlags {
            cloud_enabled: true,
            rollout_percentage: 0,
            ..FeatureFlags::default()
        };
        assert_eq!(
            flags.chain_for("device-1"),
            vec![AnalyzerKind::Cloud, AnalyzerKind::Legacy]
        );
    }

    #[test]
    fn partial_rollout_follows_bucket() {
        let flags = FeatureFlags {
            rollout_percentage: 50,
            ..FeatureFlags::default()
        };
        for i in 0..50 {
            let id = format!("device-{i}");
            let expected = rollout::bucket(ON_DEVICE_FEATURE_KEY, &id) < 50;
            let chain = flags.chain_for(&id);
            assert_eq!(chain.contains(&AnalyzerKind::OnDevice), expected);
        }
    }

    // === Orchestration ===

    #[tokio::test]
    async fn first_success_wins() {
        let orchestrator = FallbackOrchestrator::new(FeatureFlags::default())
            .with_analyzer(analyzer(AnalyzerKind::OnDevice, Ok(())))
            .with_analyzer(unused(AnalyzerKind::Legacy));

        let outcome = orchestrator.analyze("device-1", &request()).await.unwrap();
        assert_eq!(outcome.analyzer, AnalyzerKind::OnDevice);
        assert!(!outcome.fell_back());
    }

    #[tokio::test]
    async fn failure_falls_through_each_analyzer_once() {
        let flags = FeatureFlags {
            cloud_enabled: true,
            ..FeatureFlags::default()
        };
        let orchestrator = FallbackOrchestrator::new(flags)
            .with_analyzer(analyzer(AnalyzerKind::OnDevice, Err("thermal")))
            .with_analyzer(analyzer(AnalyzerKind::Cloud, Err("offline")))
            .with_analyzer(analyzer(AnalyzerKind::Legacy, Ok(())));

        let outcome = orchestrator.analyze("device-1", &request()).await.unwrap();
        assert_eq!(outcome.analyzer, AnalyzerKind::Legacy);
        let failed: Vec<_> = outcome.failed.iter().map(|f| f.analyzer).collect();
        assert_eq!(failed, vec![AnalyzerKind::OnDevice, AnalyzerKind::Cloud]);
    }

    #[tokio::test]
    async fn emergency_rollback_never_touches_on_device() {
        let flags = FeatureFlags {
            emergency_rollback: true,
            ..FeatureFlags::default()
        };
        let orchestrator = FallbackOrchestrator::new(flags)
            .with_analyzer(unused(AnalyzerKind::OnDevice))
            .with_analyzer(analyzer(AnalyzerKind::Legacy, Ok(())));

        let outcome = orchestrator.analyze("device-1", &request()).await.unwrap();
        assert_eq!(outcome.analyzer, AnalyzerKind::Legacy);
    }

    #[tokio::test]
    async fn all_failures_report_last_error() {
        let orchestrator = FallbackOrchestrator::new(FeatureFlags::default())
            .with_analyzer(analyzer(AnalyzerKind::OnDevice, Err("oom")))
            .with_analyzer(analyzer(AnalyzerKind::Legacy, Err("crashed")));

        let err = orchestrator.analyze("device-1", &request()).await.unwrap_err();
        match err {
            ApplicationError::AllAnalyzersFailed {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 2);
                assert!(last_error.contains("crashed"));
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unregistered_analyzers_are_skipped() {
        let orchestrator = FallbackOrchestrator::new(FeatureFlags::default())
            .with_analyzer(analyzer(AnalyzerKind::Legacy, Ok(())));

        assert_eq!(orchestrator.plan("device-1"), vec![AnalyzerKind::Legacy]);
        let outcome = orchestrator.analyze("device-1", &request()).await.unwrap();
        assert_eq!(outcome.analyzer, AnalyzerKind::Legacy);
    }

    #[tokio::test]
    async fn nothing_registered_is_not_available() {
        let orchestrator = FallbackOrchestrator::new(FeatureFlags::default());
        let err = orchestrator.analyze("device-1", &request()).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotAvailable(_)));
    }

    #[tokio::test]
    async fn flag_updates_apply_to_next_call() {
        let orchestrator = FallbackOrchestrator::new(FeatureFlags::default())
            .with_analyzer(unused(AnalyzerKind::OnDevice))
            .with_analyzer(analyzer(AnalyzerKind::Legacy, Ok(())));

        orchestrator.update_flags(FeatureFlags {
            emergency_rollback: true,
            ..FeatureFlags::default()
        });
        let outcome = orchestrator.analyze("device-1", &request()).await.unwrap();
        assert_eq!(outcome.analyzer, AnalyzerKind::Legacy);
        assert!(orchestrator.flags().emergency_rollback);
    }
}
