//! JSON file baseline store
//!
//! One file holds a map from backend label to its baseline. Writes go to a
//! sibling temporary file that is renamed over the original, so readers
//! never observe a half-written map.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use application::ApplicationError;
use application::ports::{BaselineStore, PerformanceBaseline};
use async_trait::async_trait;
use domain::ConcreteBackend;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

type BaselineMap = BTreeMap<String, PerformanceBaseline>;

/// Baselines persisted in a single JSON document
#[derive(Debug)]
pub struct JsonFileBaselineStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileBaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored baseline, keyed by backend label
    pub async fn all(&self) -> Result<BaselineMap, ApplicationError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BaselineMap::new()),
            Err(e) => return Err(storage_error("read", &self.path, &e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(BaselineMap::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            ApplicationError::Storage(format!(
                "baseline file {} is not valid JSON: {e}",
                self.path.display()
            ))
        })
    }

    async fn write_all(&self, map: &BaselineMap) -> Result<(), ApplicationError> {
        let json = serde_json::to_vec_pretty(map)
            .map_err(|e| ApplicationError::Internal(format!("serialize baselines: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error("create directory for", &self.path, &e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| storage_error("write", &tmp, &e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| storage_error("replace", &self.path, &e))
    }
}

fn storage_error(action: &str, path: &Path, err: &io::Error) -> ApplicationError {
    ApplicationError::Storage(format!("failed to {action} {}: {err}", path.display()))
}

#[async_trait]
impl BaselineStore for JsonFileBaselineStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn get(
        &self,
        backend: ConcreteBackend,
    ) -> Result<Option<PerformanceBaseline>, ApplicationError> {
        Ok(self.all().await?.remove(backend.label()))
    }

    #[instrument(skip(self, baseline), fields(backend = %baseline.backend))]
    async fn put(&self, baseline: PerformanceBaseline) -> Result<(), ApplicationError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.all().await?;
        map.insert(baseline.backend.label().to_string(), baseline);
        self.write_all(&map).await?;
        debug!(entries = map.len(), "Baseline stored");
        Ok(())
    }
}
