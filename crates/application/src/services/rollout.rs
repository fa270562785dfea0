//! Percentage-based gradual rollout
//!
//! Rollout decisions are a pure function of a feature key, a stable device
//! or user identifier and a target percentage. The same inputs always give
//! the same answer on every device and every run.

/// Bucket in `0..100` for `stable_id` under `feature_key`
///
/// BLAKE3 of `"{feature_key}:{stable_id}"`, first eight bytes read as a
/// little-endian integer, modulo 100. Keying by feature keeps rollouts of
/// different features independent for the same device.
#[must_use]
pub fn bucket(feature_key: &str, stable_id: &str) -> u8 {
    let hash = blake3::hash(format!("{feature_key}:{stable_id}").as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    let value = u64::from_le_bytes(prefix) % 100;
    u8::try_from(value).unwrap_or(99)
}

/// Whether `stable_id` falls inside a `percentage` rollout of `feature_key`
///
/// Percentages of 100 or more enable everyone; 0 enables no one.
#[must_use]
pub fn is_enabled(feature_key: &str, stable_id: &str, percentage: u8) -> bool {
    if percentage >= 100 {
        return true;
    }
    bucket(feature_key, stable_id) < percentage
}
