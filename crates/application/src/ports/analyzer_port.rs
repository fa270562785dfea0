//! Hazard analyzer port - Interface for anything that can assess a site image

use std::fmt;

use async_trait::async_trait;
use domain::{AnalysisRequest, AnalysisResult};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// Family of analyzer behind a port
///
/// The legacy detector is the lowest-risk option and the only one used
/// under emergency rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    /// The on-device multi-backend engine
    OnDevice,
    /// A remote analysis service
    Cloud,
    /// The previous local detector, CPU only
    Legacy,
}

impl AnalyzerKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OnDevice => "on_device",
            Self::Cloud => "cloud",
            Self::Legacy => "legacy",
        }
    }
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Port for hazard analysis
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HazardAnalyzerPort: Send + Sync {
    /// Which analyzer family this is
    fn kind(&self) -> AnalyzerKind;

    /// Analyze one request; no retries are performed behind this call
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ApplicationError>;
}
