//! Compute backend identifiers
//!
//! A [`ConcreteBackend`] is something a session can be bound to. A
//! [`BackendPreference`] is what a caller asks for; its `Auto` variant must be
//! resolved to a concrete backend before anything is stored.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Concrete execution target for model inference
///
/// Variants are declared from least to most specialized, so the derived
/// ordering matches the selection ladder read bottom-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConcreteBackend {
    /// General-purpose CPU execution, available everywhere
    #[serde(rename = "cpu")]
    Cpu,
    /// GPU via the render pipeline (OpenGL ES)
    #[serde(rename = "gpu_opengl")]
    GpuOpenGl,
    /// GPU via the compute pipeline (OpenCL)
    #[serde(rename = "gpu_opencl")]
    GpuOpenCl,
    /// Generic platform NPU (Android NNAPI)
    #[serde(rename = "npu_nnapi")]
    NpuNnapi,
    /// Vendor-specific NPU (Qualcomm Hexagon HTP)
    #[serde(rename = "npu_qti_htp")]
    NpuQtiHtp,
}

impl ConcreteBackend {
    /// Stable identifier used in configuration, logs and errors
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::GpuOpenGl => "gpu_opengl",
            Self::GpuOpenCl => "gpu_opencl",
            Self::NpuNnapi => "npu_nnapi",
            Self::NpuQtiHtp => "npu_qti_htp",
        }
    }

    /// All backends, least specialized first
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::Cpu,
            Self::GpuOpenGl,
            Self::GpuOpenCl,
            Self::NpuNnapi,
            Self::NpuQtiHtp,
        ]
    }

    /// Whether this backend runs on dedicated acceleration hardware
    #[must_use]
    pub const fn is_accelerated(&self) -> bool {
        !matches!(self, Self::Cpu)
    }

    /// Whether this backend is one of the NPU tiers
    #[must_use]
    pub const fn is_npu(&self) -> bool {
        matches!(self, Self::NpuNnapi | Self::NpuQtiHtp)
    }
}

impl fmt::Display for ConcreteBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ConcreteBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu_opengl" | "opengl" => Ok(Self::GpuOpenGl),
            "gpu_opencl" | "opencl" => Ok(Self::GpuOpenCl),
            "npu_nnapi" | "nnapi" => Ok(Self::NpuNnapi),
            "npu_qti_htp" | "qti_htp" | "htp" => Ok(Self::NpuQtiHtp),
            other => Err(DomainError::UnknownBackend(other.to_string())),
        }
    }
}

/// What a caller asks for when initializing a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BackendPreference {
    /// Resolve the best backend for the device at initialization time
    #[default]
    Auto,
    /// Use exactly this backend or fail
    Concrete(ConcreteBackend),
}

impl BackendPreference {
    /// The requested backend, if one was named explicitly
    #[must_use]
    pub const fn concrete(&self) -> Option<ConcreteBackend> {
        match self {
            Self::Auto => None,
            Self::Concrete(backend) => Some(*backend),
        }
    }
}

impl From<ConcreteBackend> for BackendPreference {
    fn from(backend: ConcreteBackend) -> Self {
        Self::Concrete(backend)
    }
}

impl fmt::Display for BackendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Concrete(backend) => write!(f, "{backend}"),
        }
    }
}

impl FromStr for BackendPreference {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            s.parse().map(Self::Concrete)
        }
    }
}

impl TryFrom<String> for BackendPreference {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BackendPreference> for String {
    fn from(preference: BackendPreference) -> Self {
        preference.to_string()
    }
}

/// Backends a device is allowed to use
///
/// Always contains [`ConcreteBackend::Cpu`]; there is no way to construct or
/// deserialize a set without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ConcreteBackend>", into = "Vec<ConcreteBackend>")]
pub struct BackendSet(BTreeSet<ConcreteBackend>);

impl BackendSet {
    /// A set holding only the CPU backend
    #[must_use]
    pub fn baseline() -> Self {
        Self(BTreeSet::from([ConcreteBackend::Cpu]))
    }

    /// Add a backend, returning the updated set
    #[must_use]
    pub fn with(mut self, backend: ConcreteBackend) -> Self {
        self.0.insert(backend);
        self
    }

    /// Add a backend in place
    pub fn insert(&mut self, backend: ConcreteBackend) {
        self.0.insert(backend);
    }

    /// Whether the device may use this backend
    #[must_use]
    pub fn contains(&self, backend: ConcreteBackend) -> bool {
        self.0.contains(&backend)
    }

    /// Number of supported backends (never zero)
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with std collections
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate least specialized first
    pub fn iter(&self) -> impl Iterator<Item = ConcreteBackend> + '_ {
        self.0.iter().copied()
    }

    /// Most specialized backend in the set
    #[must_use]
    pub fn most_specialized(&self) -> ConcreteBackend {
        self.0
            .last()
            .copied()
            .unwrap_or(ConcreteBackend::Cpu)
    }
}

impl Default for BackendSet {
    fn default() -> Self {
        Self::baseline()
    }
}

impl From<Vec<ConcreteBackend>> for BackendSet {
    fn from(backends: Vec<ConcreteBackend>) -> Self {
        backends
            .into_iter()
            .fold(Self::baseline(), |set, backend| set.with(backend))
    }
}

impl From<BackendSet> for Vec<ConcreteBackend> {
    fn from(set: BackendSet) -> Self {
        set.0.into_iter().collect()
    }
}

impl fmt::Display for BackendSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.0.iter().map(ConcreteBackend::label).collect();
        write!(f, "[{}]", labels.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_str() {
        for backend in ConcreteBackend::all() {
            assert_eq!(backend.label().parse::<ConcreteBackend>().unwrap(), backend);
        }
    }

    #[test]
    fn from_str_accepts_short_aliases() {
        assert_eq!("NNAPI".parse::<ConcreteBackend>().unwrap(), ConcreteBackend::NpuNnapi);
        assert_eq!("htp".parse::<ConcreteBackend>().unwrap(), ConcreteBackend::NpuQtiHtp);
        assert_eq!("opencl".parse::<ConcreteBackend>().unwrap(), ConcreteBackend::GpuOpenCl);
    }

    #[test]
    fn from_str_rejects_unknown() {
        let err = "tpu".parse::<ConcreteBackend>().unwrap_err();
        assert_eq!(err, DomainError::UnknownBackend("tpu".to_string()));
    }

    #[test]
    fn ordering_follows_specialization() {
        assert!(ConcreteBackend::Cpu < ConcreteBackend::GpuOpenGl);
        assert!(ConcreteBackend::GpuOpenCl < ConcreteBackend::NpuNnapi);
        assert!(ConcreteBackend::NpuNnapi < ConcreteBackend::NpuQtiHtp);
    }

    #[test]
    fn only_cpu_is_unaccelerated() {
        assert!(!ConcreteBackend::Cpu.is_accelerated());
        assert!(ConcreteBackend::GpuOpenGl.is_accelerated());
        assert!(ConcreteBackend::NpuQtiHtp.is_npu());
        assert!(!ConcreteBackend::GpuOpenCl.is_npu());
    }

    #[test]
    fn preference_parses_auto_case_insensitively() {
        assert_eq!("AUTO".parse::<BackendPreference>().unwrap(), BackendPreference::Auto);
        assert_eq!(
            "gpu_opencl".parse::<BackendPreference>().unwrap(),
            BackendPreference::Concrete(ConcreteBackend::GpuOpenCl)
        );
    }

    #[test]
    fn preference_concrete_accessor() {
        assert_eq!(BackendPreference::Auto.concrete(), None);
        assert_eq!(
            BackendPreference::from(ConcreteBackend::Cpu).concrete(),
            Some(ConcreteBackend::Cpu)
        );
    }

    #[test]
    fn preference_serializes_as_string() {
        let json = serde_json::to_string(&BackendPreference::Auto).unwrap();
        assert_eq!(json, "\"auto\"");
        let parsed: BackendPreference = serde_json::from_str("\"npu_nnapi\"").unwrap();
        assert_eq!(parsed, BackendPreference::Concrete(ConcreteBackend::NpuNnapi));
        assert!(serde_json::from_str::<BackendPreference>("\"quantum\"").is_err());
    }

    #[test]
    fn baseline_set_contains_cpu_only() {
        let set = BackendSet::baseline();
        assert_eq!(set.len(), 1);
        assert!(set.contains(ConcreteBackend::Cpu));
        assert!(!set.is_empty());
    }

    #[test]
    fn deserializing_a_set_always_adds_cpu() {
        let set: BackendSet = serde_json::from_str("[\"gpu_opengl\"]").unwrap();
        assert!(set.contains(ConcreteBackend::Cpu));
        assert!(set.contains(ConcreteBackend::GpuOpenGl));

        let empty: BackendSet = serde_json::from_str("[]").unwrap();
        assert_eq!(empty, BackendSet::baseline());
    }

    #[test]
    fn most_specialized_picks_highest() {
        let set = BackendSet::baseline()
            .with(ConcreteBackend::GpuOpenGl)
            .with(ConcreteBackend::NpuNnapi);
        assert_eq!(set.most_specialized(), ConcreteBackend::NpuNnapi);
        assert_eq!(BackendSet::baseline().most_specialized(), ConcreteBackend::Cpu);
    }

    #[test]
    fn display_lists_labels_in_order() {
        let set = BackendSet::baseline().with(ConcreteBackend::GpuOpenGl);
        assert_eq!(set.to_string(), "[cpu, gpu_opengl]");
    }
}
