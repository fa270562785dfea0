//! Infrastructure layer - Adapters for the device, filesystem and runtime
//!
//! Implements the engine's collaborator ports and the application's ports:
//! model files, device readings, the simulated native runtime, baseline
//! storage, configuration loading and logging setup.

pub mod adapters;
pub mod config;
pub mod telemetry;

pub use adapters::*;
pub use config::{AppConfig, LoggingConfig, ModelConfig, RegressionConfig};
pub use telemetry::{TelemetryError, TelemetryGuard, init_scoped_telemetry, init_telemetry};
