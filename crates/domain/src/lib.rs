//! Domain layer for HazardLens
//!
//! Contains the value objects and entities exchanged by the on-device
//! hazard analysis engine: backends, device profiles, requests, detections
//! and performance snapshots. This layer performs no I/O.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
