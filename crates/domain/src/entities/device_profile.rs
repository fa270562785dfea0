//! Device profile entity

use serde::{Deserialize, Serialize};

/// Hardware facts about the device a session runs on
///
/// Computed once when a session starts; the engine may refresh it, but the
/// bound backend is never re-derived from a refreshed profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Platform API level (Android SDK_INT)
    pub api_level: u32,
    /// Chipset or board identifier (e.g. `ro.board.platform`)
    pub board: String,
    /// Total physical memory in MiB
    pub total_memory_mb: u64,
    /// Temperature at the time of profiling, in degrees Celsius
    pub temperature_celsius: f32,
}

impl DeviceProfile {
    /// Create a new profile
    pub fn new(
        api_level: u32,
        board: impl Into<String>,
        total_memory_mb: u64,
        temperature_celsius: f32,
    ) -> Self {
        Self {
            api_level,
            board: board.into(),
            total_memory_mb,
            temperature_celsius,
        }
    }

    /// Case-insensitive substring match of the board against any signature
    #[must_use]
    pub fn board_matches<S: AsRef<str>>(&self, signatures: &[S]) -> bool {
        let board = self.board.to_lowercase();
        signatures
            .iter()
            .map(AsRef::as_ref)
            .filter(|sig| !sig.is_empty())
            .any(|sig| board.contains(&sig.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_match_is_case_insensitive_substring() {
        let profile = DeviceProfile::new(34, "SM8550-Kalama", 8192, 35.0);
        assert!(profile.board_matches(&["sm8"]));
        assert!(profile.board_matches(&["KALAMA"]));
        assert!(!profile.board_matches(&["exynos", "tensor"]));
    }

    #[test]
    fn empty_signature_never_matches() {
        let profile = DeviceProfile::new(34, "mt6989", 8192, 35.0);
        assert!(!profile.board_matches(&[""]));
    }

    #[test]
    fn serialization_roundtrip() {
        let profile = DeviceProfile::new(33, "gs201", 4096, 41.5);
        let json = serde_json::to_string(&profile).unwrap();
        let parsed: DeviceProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, profile);
    }
}
