//! Severity tier value object

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity tier shared by hazards, violations and the overall assessment
///
/// Ordered so that `High > Medium > Low`, which lets callers sort
/// recommendations with `sort_by(|a, b| b.cmp(a))`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// No immediate danger
    #[default]
    Low,
    /// Needs attention before work continues
    Medium,
    /// Stop work until resolved
    High,
}

impl Severity {
    /// Get a human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Check if this severity is higher than another
    #[must_use]
    pub fn is_higher_than(&self, other: &Self) -> bool {
        self > other
    }

    /// All tiers, highest first
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::High, Self::Medium, Self::Low]
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
