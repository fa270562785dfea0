//! Value Objects - Immutable, identity-less domain primitives

mod backend;
mod bounding_box;
mod hazard_category;
mod severity;
mod work_type;

pub use backend::{BackendPreference, BackendSet, ConcreteBackend};
pub use bounding_box::{BoundingBox, EDGE_EPSILON};
pub use hazard_category::{HazardCategory, PpeItem};
pub use severity::Severity;
pub use work_type::WorkType;
