//! Builds device readers, engine sessions and the analyzer chain

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ai_core::{DeviceCapabilities, HazardEngine, ModelLoader, NativeRuntime};
use anyhow::Context;
use application::{AnalyzerKind, FallbackOrchestrator, FeatureFlags};
use clap::Args;
use domain::{BackendPreference, ConcreteBackend};
use infrastructure::{
    AppConfig, FileModelLoader, ModelConfig, OnDeviceAnalyzerAdapter, StaticDeviceCapabilities,
    SystemDeviceCapabilities,
};
use tracing::{info, warn};

/// Where device readings come from
#[derive(Debug, Clone, Default, Args)]
pub struct DeviceArgs {
    /// JSON device description to use instead of live readings
    #[arg(long)]
    pub device: Option<PathBuf>,

    /// Override the platform API level
    #[arg(long)]
    pub api_level: Option<u32>,

    /// Override the board identifier
    #[arg(long)]
    pub board: Option<String>,
}

impl DeviceArgs {
    pub fn capabilities(&self) -> anyhow::Result<Arc<dyn DeviceCapabilities>> {
        if let Some(path) = &self.device {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read device description {}", path.display()))?;
            let mut caps: StaticDeviceCapabilities = serde_json::from_str(&text)
                .with_context(|| format!("invalid device description {}", path.display()))?;
            if let Some(api_level) = self.api_level {
                caps.api_level = api_level;
            }
            if let Some(board) = &self.board {
                caps.board.clone_from(board);
            }
            return Ok(Arc::new(caps));
        }

        let mut caps = SystemDeviceCapabilities::new();
        if let Some(api_level) = self.api_level {
            caps = caps.with_api_level(api_level);
        }
        if let Some(board) = &self.board {
            caps = caps.with_board(board.clone());
        }
        Ok(Arc::new(caps))
    }
}

pub fn model_loader(model: &ModelConfig) -> FileModelLoader {
    match &model.expected_digest {
        Some(digest) => FileModelLoader::new().with_expected_digest(digest.clone()),
        None => FileModelLoader::new(),
    }
}

/// The on-device session and the CPU-only legacy session
pub struct Sessions {
    pub on_device: Arc<HazardEngine>,
    pub legacy: Arc<HazardEngine>,
}

impl std::fmt::Debug for Sessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sessions")
            .field("on_device", &self.on_device.bound_backend())
            .field("legacy", &self.legacy.bound_backend())
            .finish()
    }
}

impl Sessions {
    /// Create both sessions and try to bring each one up
    ///
    /// A session that fails to initialize stays in place uninitialized; the
    /// analyzer chain then skips past it.
    pub async fn start(
        config: &AppConfig,
        model_path: &Path,
        preference: BackendPreference,
        capabilities: Arc<dyn DeviceCapabilities>,
        runtime: Arc<dyn NativeRuntime>,
    ) -> Self {
        let loader: Arc<dyn ModelLoader> = Arc::new(model_loader(&config.model));
        let engine = || {
            Arc::new(HazardEngine::new(
                config.engine.clone(),
                Arc::clone(&capabilities),
                Arc::clone(&loader),
                Arc::clone(&runtime),
            ))
        };
        let sessions = Self {
            on_device: engine(),
            legacy: engine(),
        };

        match sessions.on_device.initialize(model_path, preference).await {
            Ok(backend) => info!(%backend, "On-device session ready"),
            Err(e) => warn!(error = %e, "On-device session unavailable"),
        }
        if let Err(e) = sessions
            .legacy
            .initialize(model_path, ConcreteBackend::Cpu.into())
            .await
        {
            warn!(error = %e, "Legacy session unavailable");
        }
        sessions
    }

    pub fn orchestrator(&self, flags: FeatureFlags) -> FallbackOrchestrator {
        FallbackOrchestrator::new(flags)
            .with_analyzer(Arc::new(OnDeviceAnalyzerAdapter::new(Arc::clone(
                &self.on_device,
            ))))
            .with_analyzer(Arc::new(
                OnDeviceAnalyzerAdapter::new(Arc::clone(&self.legacy))
                    .with_kind(AnalyzerKind::Legacy),
            ))
    }

    pub async fn shutdown(&self) {
        self.on_device.cleanup().await;
        self.legacy.cleanup().await;
    }
}
