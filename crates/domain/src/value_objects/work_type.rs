//! Work-type context tag
//!
//! The work type decides which protective equipment is mandatory and which
//! regulatory citations apply to a hazard.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::PpeItem;
use crate::errors::DomainError;

/// Kind of work being performed in the analyzed scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkType {
    #[default]
    GeneralConstruction,
    HighRiseConstruction,
    Roadwork,
    Electrical,
    Excavation,
}

impl WorkType {
    /// Identifier used on the wire and in configuration
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GeneralConstruction => "GENERAL_CONSTRUCTION",
            Self::HighRiseConstruction => "HIGH_RISE_CONSTRUCTION",
            Self::Roadwork => "ROADWORK",
            Self::Electrical => "ELECTRICAL",
            Self::Excavation => "EXCAVATION",
        }
    }

    /// Protective equipment every worker must wear for this work type
    #[must_use]
    pub const fn required_ppe(&self) -> &'static [PpeItem] {
        match self {
            Self::GeneralConstruction | Self::Roadwork | Self::Excavation => {
                &[PpeItem::HardHat, PpeItem::SafetyVest]
            },
            Self::HighRiseConstruction => {
                &[PpeItem::HardHat, PpeItem::SafetyVest, PpeItem::FallHarness]
            },
            Self::Electrical => &[PpeItem::HardHat, PpeItem::SafetyGlasses, PpeItem::Gloves],
        }
    }

    /// Whether `item` is mandatory for this work type
    #[must_use]
    pub fn requires(&self, item: PpeItem) -> bool {
        self.required_ppe().contains(&item)
    }
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "GENERAL_CONSTRUCTION" | "GENERAL" => Ok(Self::GeneralConstruction),
            "HIGH_RISE_CONSTRUCTION" | "HIGH_RISE" => Ok(Self::HighRiseConstruction),
            "ROADWORK" | "ROAD_WORK" => Ok(Self::Roadwork),
            "ELECTRICAL" => Ok(Self::Electrical),
            "EXCAVATION" => Ok(Self::Excavation),
            _ => Err(DomainError::UnknownWorkType(s.to_string())),
        }
    }
}
