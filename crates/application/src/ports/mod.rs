//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! analyzers and storage. Adapters in the infrastructure layer implement these ports.

mod analyzer_port;
mod baseline_store;

#[cfg(test)]
pub use analyzer_port::MockHazardAnalyzerPort;
pub use analyzer_port::{AnalyzerKind, HazardAnalyzerPort};
#[cfg(test)]
pub use baseline_store::MockBaselineStore;
pub use baseline_store::{BaselineStore, PerformanceBaseline};
