//! Result post-processing
//!
//! Turns normalized detections into the structured assessment: confidence
//! filtering, the PPE presence map, regulatory mapping and aggregate risk.
//! Everything here is a pure function of the request and the detections,
//! which makes identical inputs produce identical results.

pub mod labels;
pub mod regulatory;
pub mod risk;

use std::cmp::Ordering;

use domain::{
    AnalysisRequest, AnalysisResult, ConcreteBackend, DetectedHazard, HazardCategory, PpeDetection,
    PpeItem, PpeMap, RegulatoryViolation, Severity,
};
use tracing::trace;

use crate::executor::{Detection, ExecutionOutput};
use labels::{LabelKind, classify, missing_ppe_severity};
use regulatory::{Finding, citations, recommendation};

/// Stateless post-processor
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultPostProcessor;

impl ResultPostProcessor {
    pub const fn new() -> Self {
        Self
    }

    /// Build the analysis result for one executed request
    #[must_use]
    pub fn process(
        &self,
        request: &AnalysisRequest,
        output: ExecutionOutput,
        backend: ConcreteBackend,
    ) -> AnalysisResult {
        let kept: Vec<(Detection, LabelKind)> = output
            .detections
            .into_iter()
            .filter(|d| d.confidence >= request.confidence_threshold)
            .filter_map(|d| match classify(&d.label) {
                Some(kind) => Some((d, kind)),
                None => {
                    trace!(label = %d.label, "Ignoring unknown label");
                    None
                },
            })
            .collect();

        let workers_present = kept.iter().any(|(_, kind)| kind.implies_worker());
        let ppe = build_ppe_map(&kept);
        let missing_required: Vec<PpeItem> = if workers_present {
            request
                .work_type
                .required_ppe()
                .iter()
                .copied()
                .filter(|item| !ppe.get(item).is_some_and(|p| p.present))
                .collect()
        } else {
            Vec::new()
        };

        let hazards = build_hazards(&kept, request);
        let violations = if request.include_regulatory_codes {
            build_violations(&hazards, &missing_required, request)
        } else {
            Vec::new()
        };

        // A missing required item counts once, however many detections report it
        let serious = hazards
            .iter()
            .filter(|h| h.severity == Severity::High)
            .filter(|h| {
                !matches!(
                    classify(&h.label),
                    Some(LabelKind::PpeMissing(item)) if missing_required.contains(&item)
                )
            })
            .count()
            + missing_required.len();

        let mut advice: Vec<(Severity, String)> = hazards
            .iter()
            .flat_map(|h| h.recommendations.iter().map(|r| (h.severity, r.clone())))
            .collect();
        advice.extend(missing_required.iter().map(|&item| {
            (
                missing_ppe_severity(item),
                recommendation(Finding::MissingPpe(item), request.work_type).to_string(),
            )
        }));
        advice.extend(
            violations
                .iter()
                .map(|v| (v.severity, v.recommendation.clone())),
        );

        let confidence = aggregate_confidence(&hazards, &ppe);
        let risk = risk::assess(serious, advice);

        AnalysisResult {
            hazards,
            ppe,
            violations,
            risk,
            confidence,
            processing_time_ms: output.processing_time_ms,
            backend,
        }
    }
}

/// One entry per tracked item
///
/// An item is present with the best positive confidence unless an explicit
/// `no_*` detection is more confident; with no evidence it is absent at 0.
fn build_ppe_map(kept: &[(Detection, LabelKind)]) -> PpeMap {
    PpeItem::all()
        .into_iter()
        .map(|item| {
            let best = |wanted: fn(PpeItem) -> LabelKind| {
                kept.iter()
                    .filter(|(_, kind)| *kind == wanted(item))
                    .map(|(d, _)| d.confidence)
                    .fold(None, |acc: Option<f32>, c| Some(acc.map_or(c, |a| a.max(c))))
            };
            let detection = match (best(LabelKind::PpePresent), best(LabelKind::PpeMissing)) {
                (Some(yes), Some(no)) if no > yes => PpeDetection::missing(no),
                (Some(yes), _) => PpeDetection::present(yes),
                (None, Some(no)) => PpeDetection::missing(no),
                (None, None) => PpeDetection::missing(0.0),
            };
            (item, detection)
        })
        .collect()
}

fn build_hazards(kept: &[(Detection, LabelKind)], request: &AnalysisRequest) -> Vec<DetectedHazard> {
    let mut hazards: Vec<DetectedHazard> = kept
        .iter()
        .filter_map(|(d, kind)| {
            let (finding, category, severity) = match *kind {
                LabelKind::Hazard(category) => {
                    (Finding::Hazard(category), category, category.base_severity())
                },
                LabelKind::PpeMissing(item) => (
                    Finding::MissingPpe(item),
                    HazardCategory::PpeViolation,
                    missing_ppe_severity(item),
                ),
                _ => return None,
            };
            let cited = citations(finding, request.work_type);
            let regulatory_code = if request.include_regulatory_codes {
                cited.first().map(|c| c.code.to_string())
            } else {
                None
            };
            Some(DetectedHazard {
                category,
                severity,
                confidence: d.confidence,
                bounding_box: d.bounding_box,
                label: d.label.clone(),
                regulatory_code,
                recommendations: cited.iter().map(|c| c.recommendation.to_string()).collect(),
            })
        })
        .collect();

    hazards.sort_by(compare_hazards);
    hazards
}

fn compare_hazards(a: &DetectedHazard, b: &DetectedHazard) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.label.cmp(&b.label))
        .then_with(|| a.bounding_box.x().total_cmp(&b.bounding_box.x()))
        .then_with(|| a.bounding_box.y().total_cmp(&b.bounding_box.y()))
}

/// One violation per citation code, at the highest severity that cited it
fn build_violations(
    hazards: &[DetectedHazard],
    missing_required: &[PpeItem],
    request: &AnalysisRequest,
) -> Vec<RegulatoryViolation> {
    let findings = hazards
        .iter()
        .map(|h| {
            let finding = match classify(&h.label) {
                Some(LabelKind::PpeMissing(item)) => Finding::MissingPpe(item),
                _ => Finding::Hazard(h.category),
            };
            (finding, h.severity)
        })
        .chain(
            missing_required
                .iter()
                .map(|&item| (Finding::MissingPpe(item), missing_ppe_severity(item))),
        );

    let mut violations: Vec<RegulatoryViolation> = Vec::new();
    for (finding, severity) in findings {
        for citation in citations(finding, request.work_type) {
            match violations.iter_mut().find(|v| v.code == citation.code) {
                Some(existing) => {
                    if severity > existing.severity {
                        existing.severity = severity;
                    }
                },
                None => violations.push(RegulatoryViolation {
                    code: citation.code.to_string(),
                    description: citation.description.to_string(),
                    severity,
                    recommendation: citation.recommendation.to_string(),
                }),
            }
        }
    }

    violations.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.code.cmp(&b.code)));
    violations
}

fn aggregate_confidence(hazards: &[DetectedHazard], ppe: &PpeMap) -> f32 {
    if !hazards.is_empty() {
        return hazards.iter().map(|h| h.confidence).sum::<f32>() / hazards.len() as f32;
    }
    let observed: Vec<f32> = ppe
        .values()
        .map(|p| p.confidence)
        .filter(|&c| c > 0.0)
        .collect();
    if observed.is_empty() {
        0.0
    } else {
        observed.iter().sum::<f32>() / observed.len() as f32
    }
}
