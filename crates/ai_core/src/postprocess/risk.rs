//! Aggregate risk scoring

use domain::{RiskAssessment, Severity};

/// Score for a scene with no serious findings
pub const BASE_SCORE: u8 = 10;
/// Score added per serious finding
pub const SCORE_PER_FINDING: u32 = 30;

const CLEAN_SCENE_RECOMMENDATION: &str =
    "No serious hazards detected; continue routine site monitoring";

/// Overall tier for `serious` findings
///
/// A serious finding is a high-severity hazard or a missing required PPE item.
#[must_use]
pub const fn overall_severity(serious: usize) -> Severity {
    match serious {
        0 => Severity::Low,
        1 => Severity::Medium,
        _ => Severity::High,
    }
}

/// 0-100 score, monotonic non-decreasing in `serious`
#[must_use]
pub fn score(serious: usize) -> u8 {
    let serious = u32::try_from(serious).unwrap_or(u32::MAX);
    let raw = u32::from(BASE_SCORE).saturating_add(SCORE_PER_FINDING.saturating_mul(serious));
    u8::try_from(raw.min(100)).unwrap_or(100)
}

/// Build the assessment from the serious count and severity-tagged advice
///
/// Recommendations are ordered highest severity first, keeping first-seen
/// order within a tier and dropping duplicates.
#[must_use]
pub fn assess(serious: usize, mut advice: Vec<(Severity, String)>) -> RiskAssessment {
    advice.sort_by(|a, b| b.0.cmp(&a.0));

    let mut recommendations: Vec<String> = Vec::with_capacity(advice.len());
    for (_, text) in advice {
        if !recommendations.contains(&text) {
            recommendations.push(text);
        }
    }
    if recommendations.is_empty() {
        recommendations.push(CLEAN_SCENE_RECOMMENDATION.to_string());
    }

    RiskAssessment {
        overall: overall_severity(serious),
        score: score(serious),
        recommendations,
    }
}
