//! Domain entities - Records produced and consumed by an engine session

mod analysis;
mod device_profile;
mod performance;

pub use analysis::{
    AnalysisRequest, AnalysisResult, DEFAULT_CONFIDENCE_THRESHOLD, DetectedHazard, PpeDetection,
    PpeMap, RegulatoryViolation, RiskAssessment,
};
pub use device_profile::DeviceProfile;
pub use performance::PerformanceSnapshot;
