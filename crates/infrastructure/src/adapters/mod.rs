//! Infrastructure adapters
//!
//! Adapters connect engine and application ports to concrete implementations.

mod baseline_store;
mod device_capabilities;
mod model_loader;
mod on_device_analyzer;
mod simulated_runtime;

pub use baseline_store::JsonFileBaselineStore;
pub use device_capabilities::{
    DEFAULT_AMBIENT_CELSIUS, StaticDeviceCapabilities, SystemDeviceCapabilities,
};
pub use model_loader::FileModelLoader;
pub use on_device_analyzer::{OnDeviceAnalyzerAdapter, map_engine_error};
pub use simulated_runtime::{
    SIMULATED_HEIGHT, SIMULATED_WIDTH, SimulatedRuntime, SimulatedRuntimeConfig,
};
