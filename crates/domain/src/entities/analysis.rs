//! Analysis request and result entities

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{
    BoundingBox, ConcreteBackend, HazardCategory, PpeItem, Severity, WorkType,
};

/// Confidence threshold applied when the caller does not pick one
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// A single image analysis request
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Encoded image bytes as captured
    pub image: Vec<u8>,
    /// Context for PPE requirements and regulatory mapping
    pub work_type: WorkType,
    /// Detections below this confidence are dropped
    pub confidence_threshold: f32,
    /// Whether to map hazards to regulatory violations
    pub include_regulatory_codes: bool,
}

impl std::fmt::Debug for AnalysisRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisRequest")
            .field("image_bytes", &self.image.len())
            .field("work_type", &self.work_type)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("include_regulatory_codes", &self.include_regulatory_codes)
            .finish()
    }
}

impl AnalysisRequest {
    /// Create a request with the default threshold and regulatory codes enabled
    pub fn new(image: impl Into<Vec<u8>>, work_type: WorkType) -> Self {
        Self {
            image: image.into(),
            work_type,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            include_regulatory_codes: true,
        }
    }

    /// Set the confidence threshold
    #[must_use]
    pub const fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Enable or disable regulatory code mapping
    #[must_use]
    pub const fn with_regulatory_codes(mut self, include: bool) -> Self {
        self.include_regulatory_codes = include;
        self
    }

    /// Check the threshold is a usable probability
    pub fn validate(&self) -> Result<(), DomainError> {
        if (0.0..=1.0).contains(&self.confidence_threshold) {
            Ok(())
        } else {
            Err(DomainError::InvalidConfidence(self.confidence_threshold))
        }
    }
}

/// A hazard that survived confidence filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedHazard {
    pub category: HazardCategory,
    pub severity: Severity,
    /// Detection confidence in `[0, 1]`
    pub confidence: f32,
    pub bounding_box: BoundingBox,
    /// Model label that produced the hazard
    pub label: String,
    /// Primary regulatory citation, when codes were requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regulatory_code: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Presence of one PPE item in the scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PpeDetection {
    pub present: bool,
    pub confidence: f32,
}

impl PpeDetection {
    pub const fn present(confidence: f32) -> Self {
        Self {
            present: true,
            confidence,
        }
    }

    pub const fn missing(confidence: f32) -> Self {
        Self {
            present: false,
            confidence,
        }
    }
}

/// PPE presence keyed by equipment item; entries are independent
pub type PpeMap = BTreeMap<PpeItem, PpeDetection>;

/// A regulation the scene appears to violate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulatoryViolation {
    /// Citation, e.g. "29 CFR 1926.501"
    pub code: String,
    pub description: String,
    pub severity: Severity,
    pub recommendation: String,
}

/// Aggregate risk for the whole scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall: Severity,
    /// 0-100, monotonic with the number of serious findings
    pub score: u8,
    /// Highest severity first
    pub recommendations: Vec<String>,
}

/// Structured output of one successful analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub hazards: Vec<DetectedHazard>,
    pub ppe: PpeMap,
    pub violations: Vec<RegulatoryViolation>,
    pub risk: RiskAssessment,
    /// Aggregate confidence of the kept detections
    pub confidence: f32,
    /// Latency measured around the native call
    pub processing_time_ms: u64,
    pub backend: ConcreteBackend,
}

impl AnalysisResult {
    /// Hazards at the given severity or above
    pub fn hazards_at_least(&self, severity: Severity) -> impl Iterator<Item = &DetectedHazard> {
        self.hazards.iter().filter(move |h| h.severity >= severity)
    }

    /// Whether any hazard or violation was found
    #[must_use]
    pub fn has_findings(&self) -> bool {
        !self.hazards.is_empty() || !self.violations.is_empty()
    }
}
