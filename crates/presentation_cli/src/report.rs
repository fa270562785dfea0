//! Human-readable rendering of command output

use std::fmt::Write;

use application::{AnalyzerKind, FallbackOutcome, RegressionReport};
use domain::{AnalysisResult, BackendSet, ConcreteBackend, DeviceProfile, PerformanceSnapshot};

/// Device profile, supported set and what auto-selection would pick
pub fn profile_summary(
    profile: &DeviceProfile,
    supported: &BackendSet,
    auto: ConcreteBackend,
    available_memory_mb: u64,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📱 Device Profile:");
    let _ = writeln!(out, "   API level:    {}", profile.api_level);
    let _ = writeln!(out, "   Board:        {}", profile.board);
    let _ = writeln!(
        out,
        "   Memory:       {} MiB total, {available_memory_mb} MiB available",
        profile.total_memory_mb
    );
    let _ = writeln!(out, "   Temperature:  {:.1}°C", profile.temperature_celsius);
    let _ = writeln!(out);
    let _ = writeln!(out, "⚙️  Supported backends: {supported}");
    let _ = writeln!(out, "🎯 Auto selection:     {auto}");
    out
}

/// One analysis run
pub fn outcome_summary(run: u32, outcome: &FallbackOutcome) -> String {
    let mut out = String::new();
    let result = &outcome.result;
    let _ = writeln!(
        out,
        "🔍 Run {run}: {} via {} in {}ms",
        risk_badge(result),
        analyzer_label(outcome.analyzer, result.backend),
        result.processing_time_ms
    );
    for failure in &outcome.failed {
        let _ = writeln!(out, "   ↪️  {} failed: {}", failure.analyzer, failure.error);
    }
    out.push_str(&result_details(result));
    out
}

fn analyzer_label(analyzer: AnalyzerKind, backend: ConcreteBackend) -> String {
    format!("{analyzer} ({backend})")
}

fn risk_badge(result: &AnalysisResult) -> String {
    format!("risk {} ({}/100)", result.risk.overall, result.risk.score)
}

/// Hazards, PPE and violations of one result
pub fn result_details(result: &AnalysisResult) -> String {
    let mut out = String::new();

    if result.hazards.is_empty() {
        let _ = writeln!(out, "   ✅ No hazards above threshold");
    }
    for hazard in &result.hazards {
        let _ = write!(
            out,
            "   ⚠️  [{}] {} ({:.0}%)",
            hazard.severity,
            hazard.category,
            hazard.confidence * 100.0
        );
        if let Some(code) = &hazard.regulatory_code {
            let _ = write!(out, " {code}");
        }
        out.push('\n');
    }

    let ppe: Vec<String> = result
        .ppe
        .iter()
        .filter(|(_, detection)| detection.confidence > 0.0)
        .map(|(item, detection)| {
            let mark = if detection.present { "✓" } else { "✗" };
            format!("{mark} {item}")
        })
        .collect();
    if !ppe.is_empty() {
        let _ = writeln!(out, "   🦺 PPE: {}", ppe.join(", "));
    }

    for violation in &result.violations {
        let _ = writeln!(
            out,
            "   📕 {} [{}] {}",
            violation.code, violation.severity, violation.description
        );
    }
    if let Some(first) = result.risk.recommendations.first() {
        let _ = writeln!(out, "   👉 {first}");
    }
    out
}

/// Session statistics
pub fn snapshot_summary(snapshot: &PerformanceSnapshot) -> String {
    let mut out = String::new();
    let backend = snapshot
        .backend
        .map_or_else(|| "none".to_string(), |b| b.to_string());
    let _ = writeln!(out, "📊 Performance ({backend}):");
    let _ = writeln!(
        out,
        "   Calls:        {} ok, {} failed ({} rejected)",
        snapshot.success_count, snapshot.failure_count, snapshot.rejected_count
    );
    let _ = writeln!(out, "   Success rate: {:.1}%", snapshot.success_rate * 100.0);
    let _ = writeln!(
        out,
        "   Latency:      {:.1}ms avg ({:.2}/s)",
        snapshot.average_processing_ms,
        snapshot.throughput_per_sec()
    );
    let _ = writeln!(
        out,
        "   Memory:       {:.1} MiB avg, {} MiB peak",
        snapshot.average_memory_mb, snapshot.peak_memory_mb
    );
    if snapshot.thermal_throttled {
        let _ = writeln!(out, "   🔥 Thermal throttling active");
    } else if snapshot.thermal_elevated {
        let _ = writeln!(out, "   🌡️  Temperature elevated");
    }
    out
}

/// Per-metric comparison table
pub fn regression_table(report: &RegressionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📈 Regression check ({}):", report.backend);
    if report.comparisons.is_empty() {
        let _ = writeln!(out, "   No comparable metrics");
    }
    for c in &report.comparisons {
        let mark = if c.regressed { "❌" } else { "✅" };
        let metric = c.metric.to_string();
        let _ = writeln!(
            out,
            "   {mark} {metric:<10} baseline {:>9.2}  current {:>9.2}  {:+6.1}% (limit {:.0}%)",
            c.baseline,
            c.current,
            c.degradation_pct,
            c.threshold_pct
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use application::{FailedAttempt, Metric, MetricComparison};
    use domain::{
        BoundingBox, DetectedHazard, HazardCategory, PpeDetection, PpeItem, PpeMap,
        RegulatoryViolation, RiskAssessment, Severity,
    };

    fn result() -> AnalysisResult {
        let mut ppe = PpeMap::new();
        ppe.insert(PpeItem::HardHat, PpeDetection::missing(0.9));
        ppe.insert(PpeItem::SafetyVest, PpeDetection::present(0.8));
        ppe.insert(PpeItem::Gloves, PpeDetection::missing(0.0));
        AnalysisResult {
            hazards: vec![DetectedHazard {
                category: HazardCategory::PpeViolation,
                severity: Severity::Medium,
                confidence: 0.9,
                bounding_box: BoundingBox::new(0.1, 0.1, 0.2, 0.3, 0.9).unwrap(),
                label: "no_hard_hat".to_string(),
                regulatory_code: Some("29 CFR 1926.100".to_string()),
                recommendations: Vec::new(),
            }],
            ppe,
            violations: vec![RegulatoryViolation {
                code: "29 CFR 1926.100".to_string(),
                description: "Head protection".to_string(),
                severity: Severity::Medium,
                recommendation: "Wear hard hats".to_string(),
            }],
            risk: RiskAssessment {
                overall: Severity::Medium,
                score: 40,
                recommendations: vec!["Wear hard hats".to_string()],
            },
            confidence: 0.9,
            processing_time_ms: 31,
            backend: ConcreteBackend::NpuNnapi,
        }
    }

    #[test]
    fn details_list_hazards_ppe_and_violations() {
        let text = result_details(&result());
        assert!(text.contains("29 CFR 1926.100"));
        assert!(text.contains("90%"));
        assert!(text.contains("✗ Hard hat, ✓ High-visibility vest"));
        assert!(text.contains("Wear hard hats"));
        // Undetected items are omitted
        assert!(!text.contains("Gloves"));
    }

    #[test]
    fn outcome_names_analyzer_and_failures() {
        let outcome = FallbackOutcome {
            result: result(),
            analyzer: AnalyzerKind::Legacy,
            failed: vec![FailedAttempt {
                analyzer: AnalyzerKind::OnDevice,
                error: "Resource exhausted: too hot".to_string(),
            }],
        };
        let text = outcome_summary(3, &outcome);
        assert!(text.starts_with("🔍 Run 3:"));
        assert!(text.contains("legacy (npu_nnapi)"));
        assert!(text.contains("on_device failed: Resource exhausted"));
    }

    #[test]
    fn snapshot_summary_reports_counts() {
        let snapshot = PerformanceSnapshot {
            backend: Some(ConcreteBackend::Cpu),
            analysis_count: 4,
            success_count: 3,
            failure_count: 2,
            rejected_count: 1,
            average_processing_ms: 125.0,
            success_rate: 0.6,
            thermal_throttled: true,
            ..PerformanceSnapshot::default()
        };
        let text = snapshot_summary(&snapshot);
        assert!(text.contains("(cpu)"));
        assert!(text.contains("3 ok, 2 failed (1 rejected)"));
        assert!(text.contains("60.0%"));
        assert!(text.contains("8.00/s"));
        assert!(text.contains("Thermal throttling"));
        assert!(!text.contains("Temperature elevated"));
    }

    #[test]
    fn snapshot_summary_reports_elevated_temperature() {
        let snapshot = PerformanceSnapshot {
            thermal_elevated: true,
            ..PerformanceSnapshot::default()
        };
        let text = snapshot_summary(&snapshot);
        assert!(text.contains("Temperature elevated"));
        assert!(!text.contains("Thermal throttling"));
    }

    #[test]
    fn regression_table_marks_failures() {
        let report = RegressionReport {
            backend: ConcreteBackend::GpuOpenCl,
            comparisons: vec![MetricComparison {
                metric: Metric::Latency,
                baseline: 100.0,
                current: 150.0,
                degradation_pct: 50.0,
                threshold_pct: 15.0,
                regressed: true,
            }],
        };
        let text = regression_table(&report);
        assert!(text.contains("gpu_opencl"));
        assert!(text.contains("❌"));
        assert!(text.contains("+50.0%"));
    }

    #[test]
    fn profile_summary_shows_selection() {
        let profile = DeviceProfile::new(34, "sm8550", 8192, 36.5);
        let supported = BackendSet::from(vec![ConcreteBackend::Cpu, ConcreteBackend::NpuQtiHtp]);
        let text = profile_summary(&profile, &supported, ConcreteBackend::NpuQtiHtp, 4096);
        assert!(text.contains("sm8550"));
        assert!(text.contains("36.5°C"));
        assert!(text.contains("Auto selection:     npu_qti_htp"));
    }
}
