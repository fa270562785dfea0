//! AI Core - On-device hazard analysis engine
//!
//! Picks a compute backend for the device, guards each call against memory
//! and thermal pressure, runs the native detector and turns its output into
//! a structured safety assessment with running performance statistics.

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod guard;
pub mod ports;
pub mod postprocess;
pub mod profiler;
pub mod selector;
pub mod telemetry;

pub use config::{EngineConfig, MemoryPolicy, ProfilerPolicy, SelectionPolicy, ThermalPolicy};
pub use engine::{HazardEngine, SessionState};
pub use error::{EngineError, InferenceError};
pub use executor::{Detection, ExecutionOutput, InferenceExecutor};
pub use guard::{ResourceGuard, ThermalStatus};
pub use ports::{
    DeviceCapabilities, ModelArtifact, ModelLoader, NativeHandle, NativeRuntime, RawDetection,
    RawInference, RuntimeError,
};
pub use postprocess::ResultPostProcessor;
pub use profiler::DeviceProfiler;
pub use selector::BackendSelector;
pub use telemetry::PerformanceTelemetry;
