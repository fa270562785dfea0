//! Hazard analysis engine session
//!
//! One [`HazardEngine`] owns one session: UNINITIALIZED, then INITIALIZING
//! while the profiler, selector and init-time guard run, then READY bound to
//! exactly one concrete backend. Per-call failures never leave READY; only
//! [`HazardEngine::cleanup`] does.
//!
//! Concurrent `analyze` calls queue on the native handle. The handle sits
//! behind a FIFO-fair async mutex, so callers issuing work in parallel are
//! serialized at the hardware boundary rather than turned away.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use domain::{
    AnalysisRequest, AnalysisResult, BackendPreference, BackendSet, ConcreteBackend,
    DeviceProfile, PerformanceSnapshot,
};
use parking_lot::RwLock;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::executor::InferenceExecutor;
use crate::guard::{ResourceGuard, ThermalStatus};
use crate::ports::{
    DeviceCapabilities, ModelArtifact, ModelLoader, NativeHandle, NativeRuntime, RuntimeError,
};
use crate::postprocess::ResultPostProcessor;
use crate::profiler::DeviceProfiler;
use crate::selector::BackendSelector;
use crate::telemetry::PerformanceTelemetry;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Memory sample recorded for one successful call
///
/// The guard's admission estimate is the floor; a runtime that reports a
/// larger working set raises it.
fn call_memory_mb(required_mb: u64, reported_bytes: Option<u64>) -> u64 {
    reported_bytes.map_or(required_mb, |bytes| required_mb.max(bytes.div_ceil(BYTES_PER_MB)))
}

/// Externally visible session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
        })
    }
}

struct ReadySession {
    backend: ConcreteBackend,
    supported: BackendSet,
    artifact: ModelArtifact,
    /// `None` once cleanup has released the handle
    handle: tokio::sync::Mutex<Option<NativeHandle>>,
}

enum Session {
    Uninitialized,
    Initializing { attempt: u64 },
    Ready(Arc<ReadySession>),
}

/// On-device hazard analysis engine
pub struct HazardEngine {
    config: EngineConfig,
    capabilities: Arc<dyn DeviceCapabilities>,
    loader: Arc<dyn ModelLoader>,
    runtime: Arc<dyn NativeRuntime>,
    profiler: DeviceProfiler,
    selector: BackendSelector,
    guard: ResourceGuard,
    executor: InferenceExecutor,
    postprocessor: ResultPostProcessor,
    telemetry: PerformanceTelemetry,
    session: RwLock<Session>,
    profile: RwLock<Option<DeviceProfile>>,
    attempts: AtomicU64,
}

impl std::fmt::Debug for HazardEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HazardEngine")
            .field("state", &self.state())
            .field("backend", &self.bound_backend())
            .field("profile", &*self.profile.read())
            .finish_non_exhaustive()
    }
}

impl HazardEngine {
    /// Create an engine in the UNINITIALIZED state
    pub fn new(
        config: EngineConfig,
        capabilities: Arc<dyn DeviceCapabilities>,
        loader: Arc<dyn ModelLoader>,
        runtime: Arc<dyn NativeRuntime>,
    ) -> Self {
        Self {
            profiler: DeviceProfiler::new(config.profiler.clone()),
            selector: BackendSelector::new(config.selection),
            guard: ResourceGuard::new(config.memory, config.thermal),
            executor: InferenceExecutor::new(Arc::clone(&runtime)),
            postprocessor: ResultPostProcessor::new(),
            telemetry: PerformanceTelemetry::new(),
            session: RwLock::new(Session::Uninitialized),
            profile: RwLock::new(None),
            attempts: AtomicU64::new(0),
            config,
            capabilities,
            loader,
            runtime,
        }
    }

    /// Bring the session to READY
    ///
    /// Profiles the device, resolves `preference` to one concrete backend,
    /// checks that the device can host it, loads the model and binds the
    /// native handle. Any failure leaves the session UNINITIALIZED.
    #[instrument(skip(self, model_path), fields(model = %model_path.display()))]
    pub async fn initialize(
        &self,
        model_path: &Path,
        preference: BackendPreference,
    ) -> Result<ConcreteBackend, EngineError> {
        let attempt = self.begin_initialization()?;

        match self.bring_up(model_path, preference).await {
            Ok(ready) => self.finish_initialization(attempt, ready).await,
            Err(e) => {
                self.abort_initialization(attempt);
                warn!(error = %e, "Initialization failed");
                Err(e)
            },
        }
    }

    fn begin_initialization(&self) -> Result<u64, EngineError> {
        let mut session = self.session.write();
        if !matches!(*session, Session::Uninitialized) {
            return Err(EngineError::AlreadyInitialized);
        }
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        *session = Session::Initializing { attempt };
        info!(attempt, "Session initializing");
        Ok(attempt)
    }

    async fn bring_up(
        &self,
        model_path: &Path,
        preference: BackendPreference,
    ) -> Result<ReadySession, EngineError> {
        self.config.validate()?;

        let profile = self.profiler.profile(self.capabilities.as_ref());
        let supported = self.profiler.supported_backends(&profile);
        *self.profile.write() = Some(profile.clone());
        let backend = self
            .selector
            .resolve(preference, &supported, profile.total_memory_mb)?;

        let available_mb = self.capabilities.available_memory_mb();
        self.guard.check_init_memory(backend, available_mb)?;

        let artifact = self.loader.load(model_path)?;
        debug!(
            size_bytes = artifact.size_bytes,
            digest = %artifact.digest,
            "Model artifact verified"
        );

        let handle = self
            .runtime
            .load(&artifact, backend)
            .await
            .map_err(|e| match e {
                RuntimeError::ModelRejected(msg) => EngineError::ModelLoad(msg),
                other => EngineError::Initialization(other.to_string()),
            })?;

        Ok(ReadySession {
            backend,
            supported,
            artifact,
            handle: tokio::sync::Mutex::new(Some(handle)),
        })
    }

    async fn finish_initialization(
        &self,
        attempt: u64,
        ready: ReadySession,
    ) -> Result<ConcreteBackend, EngineError> {
        let backend = ready.backend;
        let orphaned = {
            let mut session = self.session.write();
            if matches!(*session, Session::Initializing { attempt: current } if current == attempt) {
                self.telemetry.reset(Some(backend));
                info!(backend = %backend, supported = %ready.supported, "Session ready");
                *session = Session::Ready(Arc::new(ready));
                None
            } else {
                Some(ready)
            }
        };

        match orphaned {
            None => Ok(backend),
            Some(ready) => {
                if let Some(handle) = ready.handle.into_inner() {
                    self.runtime.release(handle).await;
                }
                warn!("Session cleaned up during initialization");
                Err(EngineError::Initialization(
                    "session was cleaned up during initialization".to_string(),
                ))
            },
        }
    }

    fn abort_initialization(&self, attempt: u64) {
        let mut session = self.session.write();
        if matches!(*session, Session::Initializing { attempt: current } if current == attempt) {
            *session = Session::Uninitialized;
        }
    }

    /// Analyze one image on the bound backend
    ///
    /// Guard checks run immediately before the native call, after this call
    /// has acquired the handle. Every outcome leaves the session READY.
    #[instrument(skip(self, request), fields(work_type = %request.work_type, bytes = request.image.len()))]
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, EngineError> {
        let session = self.ready_session()?;

        if let Err(e) = request.validate() {
            self.telemetry.record_rejection();
            return Err(e.into());
        }

        let handle_slot = session.handle.lock().await;
        let Some(handle) = handle_slot.as_ref() else {
            return Err(EngineError::NotReady);
        };
        trace!(backend = %session.backend, "Analyzing");

        let required_mb = match self.admit(session.backend, request.image.len()) {
            Ok(required_mb) => required_mb,
            Err(e) => {
                self.telemetry.record_rejection();
                return Err(e);
            },
        };

        let output = match self.executor.execute(handle, &request.image).await {
            Ok(output) => output,
            Err(e) => {
                self.telemetry.record_failure();
                return Err(e);
            },
        };
        drop(handle_slot);

        let memory_mb = call_memory_mb(required_mb, output.memory_bytes);
        let processing_time_ms = output.processing_time_ms;
        let result = self
            .postprocessor
            .process(&request, output, session.backend);
        self.telemetry.record_success(processing_time_ms, memory_mb);

        trace!(
            hazards = result.hazards.len(),
            risk = %result.risk.overall,
            processing_time_ms,
            "Analysis complete"
        );
        Ok(result)
    }

    /// Per-call guard checks against fresh device readings
    fn admit(&self, backend: ConcreteBackend, image_len: usize) -> Result<u64, EngineError> {
        let temperature = self.capabilities.temperature_celsius();
        self.telemetry
            .observe_thermal(self.guard.is_throttling(temperature));

        let available_mb = self.capabilities.available_memory_mb();
        let required_mb = self
            .guard
            .check_call_memory(backend, image_len, available_mb)?;
        let status = self.guard.check_thermal(temperature)?;
        if status == ThermalStatus::Elevated {
            debug!(%backend, temperature, "Admitted at elevated temperature");
        }
        self.telemetry.observe_admission(status);
        Ok(required_mb)
    }

    fn ready_session(&self) -> Result<Arc<ReadySession>, EngineError> {
        match &*self.session.read() {
            Session::Ready(ready) => Ok(Arc::clone(ready)),
            _ => Err(EngineError::NotReady),
        }
    }

    /// Immutable copy of the session's statistics
    pub fn performance_snapshot(&self) -> PerformanceSnapshot {
        self.telemetry.snapshot()
    }

    /// Return to UNINITIALIZED and release the native handle
    ///
    /// Waits for an in-flight analysis to finish; native work is never
    /// aborted midway. Safe to call in any state.
    #[instrument(skip(self))]
    pub async fn cleanup(&self) {
        let previous = std::mem::replace(&mut *self.session.write(), Session::Uninitialized);

        match previous {
            Session::Ready(ready) => {
                let handle = ready.handle.lock().await.take();
                if let Some(handle) = handle {
                    self.runtime.release(handle).await;
                }
                info!(backend = %ready.backend, "Session cleaned up");
            },
            Session::Initializing { attempt } => {
                info!(attempt, "Session cleaned up during initialization");
            },
            Session::Uninitialized => {
                debug!("Cleanup on uninitialized session");
            },
        }
    }

    pub fn state(&self) -> SessionState {
        match &*self.session.read() {
            Session::Uninitialized => SessionState::Uninitialized,
            Session::Initializing { .. } => SessionState::Initializing,
            Session::Ready(_) => SessionState::Ready,
        }
    }

    /// Backend the READY session is bound to
    pub fn bound_backend(&self) -> Option<ConcreteBackend> {
        match &*self.session.read() {
            Session::Ready(ready) => Some(ready.backend),
            _ => None,
        }
    }

    /// Backends the device supported when the session was initialized
    pub fn supported_backends(&self) -> Option<BackendSet> {
        match &*self.session.read() {
            Session::Ready(ready) => Some(ready.supported.clone()),
            _ => None,
        }
    }

    /// Model artifact the READY session was loaded from
    pub fn model_artifact(&self) -> Option<ModelArtifact> {
        match &*self.session.read() {
            Session::Ready(ready) => Some(ready.artifact.clone()),
            _ => None,
        }
    }

    /// Last device profile taken by this engine
    pub fn device_profile(&self) -> Option<DeviceProfile> {
        self.profile.read().clone()
    }

    /// Re-read device facts; the bound backend is never changed
    pub fn refresh_device_profile(&self) -> DeviceProfile {
        let profile = self.profiler.profile(self.capabilities.as_ref());
        debug!(
            total_memory_mb = profile.total_memory_mb,
            temperature_celsius = profile.temperature_celsius,
            "Device profile refreshed"
        );
        *self.profile.write() = Some(profile.clone());
        profile
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }
}
