//! Hazard categories and tracked protective equipment

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Severity;

/// Category of a detected hazard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardCategory {
    /// Unprotected edges, openings, missing guardrails
    FallProtection,
    /// Required protective equipment is not being worn
    PpeViolation,
    /// Exposed conductors and energized equipment
    Electrical,
    /// Excavators, loaders and other operating machinery
    HeavyEquipment,
    /// Moving vehicles in the work zone
    StruckBy,
    /// Suspended loads and crane operations
    Crane,
}

impl HazardCategory {
    /// Get a human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FallProtection => "Fall Protection",
            Self::PpeViolation => "PPE Compliance",
            Self::Electrical => "Electrical",
            Self::HeavyEquipment => "Heavy Equipment",
            Self::StruckBy => "Struck-By",
            Self::Crane => "Crane Operations",
        }
    }

    /// Severity assigned to a detection of this category
    #[must_use]
    pub const fn base_severity(&self) -> Severity {
        match self {
            Self::FallProtection | Self::Electrical | Self::Crane => Severity::High,
            Self::PpeViolation | Self::HeavyEquipment | Self::StruckBy => Severity::Medium,
        }
    }
}

impl fmt::Display for HazardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Protective equipment tracked in the PPE presence map
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PpeItem {
    HardHat,
    SafetyVest,
    SafetyGlasses,
    Gloves,
    FallHarness,
}

impl PpeItem {
    /// Get a human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::HardHat => "Hard hat",
            Self::SafetyVest => "High-visibility vest",
            Self::SafetyGlasses => "Safety glasses",
            Self::Gloves => "Gloves",
            Self::FallHarness => "Fall harness",
        }
    }

    /// Every tracked item
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::HardHat,
            Self::SafetyVest,
            Self::SafetyGlasses,
            Self::Gloves,
            Self::FallHarness,
        ]
    }
}

impl fmt::Display for PpeItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fall_and_electrical_are_high_severity() {
        assert_eq!(HazardCategory::FallProtection.base_severity(), Severity::High);
        assert_eq!(HazardCategory::Electrical.base_severity(), Severity::High);
        assert_eq!(HazardCategory::PpeViolation.base_severity(), Severity::Medium);
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&HazardCategory::StruckBy).unwrap();
        assert_eq!(json, "\"struck_by\"");
    }

    #[test]
    fn ppe_item_serializes_snake_case() {
        let json = serde_json::to_string(&PpeItem::HardHat).unwrap();
        assert_eq!(json, "\"hard_hat\"");
        assert_eq!(PpeItem::all().len(), 5);
    }
}
