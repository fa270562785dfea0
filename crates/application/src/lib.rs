//! Application layer - Use cases and orchestration
//!
//! Consumes the hazard analysis engine through ports: routes requests across
//! analyzers under feature flags and rollout, and checks performance
//! snapshots against per-backend baselines.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
