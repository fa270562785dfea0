//! Regulatory citation table (29 CFR 1926, construction)

use domain::{HazardCategory, PpeItem, WorkType};

/// One citable regulation with its remediation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Citation {
    pub code: &'static str,
    pub description: &'static str,
    pub recommendation: &'static str,
}

/// Something the table can cite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finding {
    Hazard(HazardCategory),
    MissingPpe(PpeItem),
}

const FALL_GENERAL: Citation = Citation {
    code: "29 CFR 1926.501",
    description: "Duty to have fall protection at unprotected edges of 6 feet or more",
    recommendation: "Install guardrails or safety nets, or provide personal fall arrest systems",
};

const FALL_SYSTEMS: Citation = Citation {
    code: "29 CFR 1926.502",
    description: "Fall protection systems criteria and practices",
    recommendation: "Ensure workers at height wear an inspected harness tied off to a rated anchor",
};

const HEAD: Citation = Citation {
    code: "29 CFR 1926.100",
    description: "Head protection required where there is danger of head injury",
    recommendation: "Require hard hats for everyone in the work area",
};

const PPE_GENERAL: Citation = Citation {
    code: "29 CFR 1926.95",
    description: "Personal protective equipment must be provided, used and maintained",
    recommendation: "Issue and enforce the protective equipment required for this task",
};

const ROADWORK_VISIBILITY: Citation = Citation {
    code: "29 CFR 1926.201",
    description: "Signaling and high-visibility apparel in traffic work zones",
    recommendation: "Require high-visibility vests and set up traffic control devices",
};

const EYE: Citation = Citation {
    code: "29 CFR 1926.102",
    description: "Eye and face protection required when exposed to flying particles or arcs",
    recommendation: "Provide safety glasses or face shields appropriate to the task",
};

const ELECTRICAL: Citation = Citation {
    code: "29 CFR 1926.416",
    description: "Protection of employees from contact with energized electrical circuits",
    recommendation: "De-energize and lock out circuits or guard exposed conductors before work",
};

const EQUIPMENT_GENERAL: Citation = Citation {
    code: "29 CFR 1926.600",
    description: "Equipment must be operated safely with barricades around swing areas",
    recommendation: "Barricade equipment swing radius and keep workers out of blind spots",
};

const EQUIPMENT_EARTHMOVING: Citation = Citation {
    code: "29 CFR 1926.602",
    description: "Earthmoving equipment requires alarms and safe operating practices",
    recommendation: "Verify back-up alarms work and assign a spotter for reversing equipment",
};

const CRANES: Citation = Citation {
    code: "29 CFR 1926.1400",
    description: "Cranes and derricks in construction",
    recommendation: "Keep workers clear of suspended loads and verify a qualified rigger and signal person",
};

const EXCAVATION: Citation = Citation {
    code: "29 CFR 1926.651",
    description: "Specific excavation requirements near operating equipment",
    recommendation: "Keep equipment and spoil piles at least 2 feet from excavation edges",
};

/// Citations that apply to `finding` under `work_type`, primary first
#[must_use]
pub fn citations(finding: Finding, work_type: WorkType) -> Vec<Citation> {
    let mut cited = match finding {
        Finding::Hazard(category) => match category {
            HazardCategory::FallProtection => vec![FALL_GENERAL, FALL_SYSTEMS],
            HazardCategory::Electrical => vec![ELECTRICAL],
            HazardCategory::HeavyEquipment => vec![EQUIPMENT_GENERAL, EQUIPMENT_EARTHMOVING],
            HazardCategory::StruckBy => vec![EQUIPMENT_GENERAL],
            HazardCategory::Crane => vec![CRANES],
            HazardCategory::PpeViolation => vec![PPE_GENERAL],
        },
        Finding::MissingPpe(item) => match item {
            PpeItem::HardHat => vec![HEAD],
            PpeItem::SafetyVest | PpeItem::Gloves => vec![PPE_GENERAL],
            PpeItem::SafetyGlasses => vec![EYE],
            PpeItem::FallHarness => vec![FALL_SYSTEMS],
        },
    };

    match (finding, work_type) {
        (
            Finding::Hazard(HazardCategory::StruckBy) | Finding::MissingPpe(PpeItem::SafetyVest),
            WorkType::Roadwork,
        ) => cited.push(ROADWORK_VISIBILITY),
        (Finding::Hazard(HazardCategory::HeavyEquipment), WorkType::Excavation) => {
            cited.push(EXCAVATION);
        },
        _ => {},
    }
    cited
}

/// Remediation text for `finding`, independent of whether codes are cited
#[must_use]
pub fn recommendation(finding: Finding, work_type: WorkType) -> &'static str {
    citations(finding, work_type)
        .first()
        .map_or(PPE_GENERAL.recommendation, |c| c.recommendation)
}
