//! Application services - Use case implementations

mod fallback_orchestrator;
mod regression_detector;
pub mod rollout;

pub use fallback_orchestrator::{
    FailedAttempt, FallbackOrchestrator, FallbackOutcome, FeatureFlags, ON_DEVICE_FEATURE_KEY,
};
pub use regression_detector::{
    Metric, MetricComparison, RegressionDetector, RegressionReport, RegressionThresholds,
};
