//! Model class label vocabulary

use domain::{HazardCategory, PpeItem, Severity};

/// What a model class label means for the assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// A worker in the scene
    Person,
    /// Scene context with no finding of its own (cones, barriers)
    Context,
    /// Protective equipment seen being worn
    PpePresent(PpeItem),
    /// Protective equipment explicitly seen missing
    PpeMissing(PpeItem),
    /// A site hazard
    Hazard(HazardCategory),
}

impl LabelKind {
    /// Whether the label implies a worker is present
    #[must_use]
    pub const fn implies_worker(&self) -> bool {
        matches!(self, Self::Person | Self::PpePresent(_) | Self::PpeMissing(_))
    }
}

/// Classify a raw label; unknown labels yield `None`
///
/// Matching ignores case and treats `-` and spaces like `_`, so `no-hardhat`
/// and `No Hard Hat` resolve the same way.
#[must_use]
pub fn classify(label: &str) -> Option<LabelKind> {
    let normalized = label.trim().to_ascii_lowercase().replace(['-', ' '], "_");

    let kind = match normalized.as_str() {
        "person" | "worker" => LabelKind::Person,
        "safety_cone" | "cone" | "barrier" => LabelKind::Context,

        "hard_hat" | "hardhat" | "helmet" => LabelKind::PpePresent(PpeItem::HardHat),
        "no_hard_hat" | "no_hardhat" | "no_helmet" => LabelKind::PpeMissing(PpeItem::HardHat),
        "safety_vest" | "vest" => LabelKind::PpePresent(PpeItem::SafetyVest),
        "no_safety_vest" | "no_vest" => LabelKind::PpeMissing(PpeItem::SafetyVest),
        "safety_glasses" | "goggles" => LabelKind::PpePresent(PpeItem::SafetyGlasses),
        "no_safety_glasses" | "no_goggles" => LabelKind::PpeMissing(PpeItem::SafetyGlasses),
        "gloves" => LabelKind::PpePresent(PpeItem::Gloves),
        "no_gloves" => LabelKind::PpeMissing(PpeItem::Gloves),
        "harness" | "fall_harness" => LabelKind::PpePresent(PpeItem::FallHarness),
        "no_harness" | "no_fall_harness" => LabelKind::PpeMissing(PpeItem::FallHarness),

        "machinery" | "excavator" => LabelKind::Hazard(HazardCategory::HeavyEquipment),
        "crane" => LabelKind::Hazard(HazardCategory::Crane),
        "truck" | "vehicle" => LabelKind::Hazard(HazardCategory::StruckBy),
        "fall_hazard" => LabelKind::Hazard(HazardCategory::FallProtection),
        "electrical_hazard" => LabelKind::Hazard(HazardCategory::Electrical),

        _ => return None,
    };
    Some(kind)
}

/// Severity of a worker missing `item`
///
/// A missing harness is a fall exposure; everything else is a compliance gap.
#[must_use]
pub const fn missing_ppe_severity(item: PpeItem) -> Severity {
    match item {
        PpeItem::FallHarness => Severity::High,
        _ => Severity::Medium,
    }
}
