//! Application configuration
//!
//! Layers, lowest precedence first: built-in defaults, an optional
//! `hazardlens.toml` (or an explicit file), then `HAZARDLENS_*` environment
//! variables with `__` between nested keys, e.g.
//! `HAZARDLENS_ENGINE__THERMAL__SEVERE_CELSIUS=85`.

use std::path::{Path, PathBuf};

use ai_core::EngineConfig;
use application::{FeatureFlags, RegressionThresholds};
use domain::BackendPreference;
use serde::{Deserialize, Serialize};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "HAZARDLENS";

/// Base name of the optional configuration file in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "hazardlens";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Engine policy: thresholds, footprints, selection tiers
    #[serde(default)]
    pub engine: EngineConfig,

    /// Model artifact and requested backend
    #[serde(default)]
    pub model: ModelConfig,

    /// Analyzer feature flags and rollout percentage
    #[serde(default)]
    pub rollout: FeatureFlags,

    /// Regression thresholds and baseline storage
    #[serde(default)]
    pub regression: RegressionConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the model file
    #[serde(default = "default_model_path")]
    pub path: PathBuf,

    /// Expected BLAKE3 hex digest; the loader rejects any other content
    #[serde(default)]
    pub expected_digest: Option<String>,

    /// Backend requested at initialization
    #[serde(default)]
    pub backend: BackendPreference,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/hazard_detector.tflite")
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            expected_digest: None,
            backend: BackendPreference::default(),
        }
    }
}

/// Regression detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionConfig {
    #[serde(default)]
    pub thresholds: RegressionThresholds,

    /// JSON file holding one baseline per backend
    #[serde(default = "default_baseline_path")]
    pub baseline_path: PathBuf,
}

fn default_baseline_path() -> PathBuf {
    PathBuf::from("hazardlens-baselines.json")
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            thresholds: RegressionThresholds::default(),
            baseline_path: default_baseline_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "hazardlens=debug,ai_core=trace"
    ///
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Emit JSON lines instead of human-readable text
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "hazardlens=info,ai_core=info,application=info,infrastructure=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional `hazardlens.*` file
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, reading `file` instead of the default file
    ///
    /// An explicit file must exist; the default file is optional.
    pub fn load_from(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let builder = config::Config::builder()
            .set_default("model.backend", "auto")?
            .add_source(file_source)
            // e.g. HAZARDLENS_ROLLOUT__ROLLOUT_PERCENTAGE=25
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that deserialize but cannot be used
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        self.engine
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;

        if self.rollout.rollout_percentage > 100 {
            return Err(config::ConfigError::Message(format!(
                "rollout.rollout_percentage must be at most 100, got {}",
                self.rollout.rollout_percentage
            )));
        }

        let thresholds = &self.regression.thresholds;
        for (name, value) in [
            ("latency_pct", thresholds.latency_pct),
            ("memory_pct", thresholds.memory_pct),
            ("throughput_pct", thresholds.throughput_pct),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(config::ConfigError::Message(format!(
                    "regression.thresholds.{name} must be a non-negative number, got {value}"
                )));
            }
        }

        Ok(())
    }
}
