//! Analyzer port adapter over the on-device engine

use std::sync::Arc;

use ai_core::{EngineError, HazardEngine, InferenceError};
use application::ApplicationError;
use application::ports::{AnalyzerKind, HazardAnalyzerPort};
use async_trait::async_trait;
use domain::{AnalysisRequest, AnalysisResult};
use tracing::instrument;

/// Exposes a [`HazardEngine`] session as a [`HazardAnalyzerPort`]
///
/// The same adapter serves the legacy slot when given an engine pinned to
/// the CPU backend.
pub struct OnDeviceAnalyzerAdapter {
    engine: Arc<HazardEngine>,
    kind: AnalyzerKind,
}

impl std::fmt::Debug for OnDeviceAnalyzerAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnDeviceAnalyzerAdapter")
            .field("kind", &self.kind)
            .field("state", &self.engine.state())
            .finish_non_exhaustive()
    }
}

impl OnDeviceAnalyzerAdapter {
    /// Adapter reporting itself as the on-device analyzer
    pub const fn new(engine: Arc<HazardEngine>) -> Self {
        Self {
            engine,
            kind: AnalyzerKind::OnDevice,
        }
    }

    /// Adapter reporting itself as `kind`
    #[must_use]
    pub const fn with_kind(mut self, kind: AnalyzerKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn engine(&self) -> &Arc<HazardEngine> {
        &self.engine
    }
}

/// Map engine failures onto the application error taxonomy
pub fn map_engine_error(err: EngineError) -> ApplicationError {
    match err {
        EngineError::Inference(
            InferenceError::EmptyInput
            | InferenceError::CorruptedInput
            | InferenceError::InvalidRequest(_),
        ) => ApplicationError::InvalidInput(err.to_string()),
        EngineError::OutOfMemory { .. } | EngineError::ThermalThrottling { .. } => {
            ApplicationError::ResourceExhausted(err.to_string())
        },
        EngineError::NotReady => ApplicationError::NotAvailable(err.to_string()),
        EngineError::ModelLoad(_)
        | EngineError::Initialization(_)
        | EngineError::UnsupportedBackend { .. }
        | EngineError::AlreadyInitialized => ApplicationError::Configuration(err.to_string()),
        EngineError::Inference(InferenceError::Runtime(_)) => {
            ApplicationError::Inference(err.to_string())
        },
    }
}

#[async_trait]
impl HazardAnalyzerPort for OnDeviceAnalyzerAdapter {
    fn kind(&self) -> AnalyzerKind {
        self.kind
    }

    #[instrument(skip(self, request), fields(analyzer = %self.kind))]
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ApplicationError> {
        self.engine
            .analyze(request.clone())
            .await
            .map_err(map_engine_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_problems_are_invalid_input() {
        let err = map_engine_error(EngineError::Inference(InferenceError::EmptyInput));
        assert!(matches!(err, ApplicationError::InvalidInput(msg) if msg == "empty image data"));
        assert!(matches!(
            map_engine_error(InferenceError::CorruptedInput.into()),
            ApplicationError::InvalidInput(_)
        ));
    }

    #[test]
    fn guard_rejections_are_retryable() {
        let oom = map_engine_error(EngineError::out_of_memory(400, 120));
        let hot = map_engine_error(EngineError::ThermalThrottling {
            temperature_celsius: 82.0,
        });
        assert!(matches!(oom, ApplicationError::ResourceExhausted(_)));
        assert!(oom.is_retryable());
        assert!(hot.is_retryable());
    }

    #[test]
    fn not_ready_is_not_available() {
        assert!(matches!(
            map_engine_error(EngineError::NotReady),
            ApplicationError::NotAvailable(_)
        ));
    }

    #[test]
    fn runtime_failure_is_inference_error() {
        let err = map_engine_error(InferenceError::Runtime("delegate crashed".into()).into());
        assert!(matches!(err, ApplicationError::Inference(_)));
        assert!(!err.is_retryable());
    }
}
