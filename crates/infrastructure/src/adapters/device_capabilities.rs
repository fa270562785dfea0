//! Device capability providers
//!
//! [`SystemDeviceCapabilities`] reads live values from procfs and sysfs on
//! Linux and Android. [`StaticDeviceCapabilities`] reports fixed values, for
//! device descriptions loaded from a file and for tests.

use std::fs;
use std::path::{Path, PathBuf};

use ai_core::DeviceCapabilities;
use domain::DeviceProfile;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Temperature reported when no thermal zone is readable
pub const DEFAULT_AMBIENT_CELSIUS: f32 = 25.0;

/// Reads device state from the running system
///
/// Every call goes back to the filesystem; nothing is cached.
#[derive(Debug, Clone)]
pub struct SystemDeviceCapabilities {
    proc_root: PathBuf,
    sys_root: PathBuf,
    api_level: Option<u32>,
    board: Option<String>,
}

impl Default for SystemDeviceCapabilities {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemDeviceCapabilities {
    /// Read from `/proc` and `/sys`
    pub fn new() -> Self {
        Self::with_roots("/proc", "/sys")
    }

    /// Read from alternative procfs and sysfs mount points
    pub fn with_roots(proc_root: impl Into<PathBuf>, sys_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            sys_root: sys_root.into(),
            api_level: None,
            board: None,
        }
    }

    /// Report this API level instead of probing the environment
    #[must_use]
    pub const fn with_api_level(mut self, api_level: u32) -> Self {
        self.api_level = Some(api_level);
        self
    }

    /// Report this board identifier instead of probing the system
    #[must_use]
    pub fn with_board(mut self, board: impl Into<String>) -> Self {
        self.board = Some(board.into());
        self
    }

    fn meminfo(&self) -> Option<MemInfo> {
        let text = fs::read_to_string(self.proc_root.join("meminfo")).ok()?;
        Some(parse_meminfo(&text))
    }

    fn probe_board(&self) -> Option<String> {
        let compatible = self.proc_root.join("device-tree").join("compatible");
        if let Ok(raw) = fs::read(&compatible) {
            // NUL-separated, most specific first; the last entry names the SoC
            if let Some(soc) = raw
                .split(|&b| b == 0)
                .filter(|s| !s.is_empty())
                .next_back()
            {
                return Some(String::from_utf8_lossy(soc).into_owned());
            }
        }

        let cpuinfo = fs::read_to_string(self.proc_root.join("cpuinfo")).ok()?;
        cpuinfo.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            (key == "Hardware" || key == "model name")
                .then(|| value.trim().to_string())
                .filter(|v| !v.is_empty())
        })
    }

    fn hottest_zone(&self) -> Option<f32> {
        let entries = fs::read_dir(self.sys_root.join("class").join("thermal")).ok()?;
        entries
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with("thermal_zone"))
            .filter_map(|e| read_zone_celsius(&e.path().join("temp")))
            .reduce(f32::max)
    }
}

impl DeviceCapabilities for SystemDeviceCapabilities {
    fn api_level(&self) -> u32 {
        self.api_level
            .or_else(|| {
                std::env::var("ANDROID_SDK_VERSION")
                    .ok()
                    .and_then(|v| v.trim().parse().ok())
            })
            .unwrap_or(0)
    }

    fn board(&self) -> String {
        self.board
            .clone()
            .or_else(|| self.probe_board())
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn total_memory_mb(&self) -> u64 {
        self.meminfo().and_then(|m| m.total_kb).unwrap_or(0) / 1024
    }

    fn available_memory_mb(&self) -> u64 {
        self.meminfo()
            .and_then(|m| m.available_kb.or(m.free_kb))
            .unwrap_or(0)
            / 1024
    }

    fn temperature_celsius(&self) -> f32 {
        self.hottest_zone().unwrap_or_else(|| {
            debug!("No readable thermal zone, assuming ambient temperature");
            DEFAULT_AMBIENT_CELSIUS
        })
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct MemInfo {
    total_kb: Option<u64>,
    available_kb: Option<u64>,
    free_kb: Option<u64>,
}

fn parse_meminfo(text: &str) -> MemInfo {
    let mut info = MemInfo::default();
    for line in text.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let value = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok());
        match key.trim() {
            "MemTotal" => info.total_kb = value,
            "MemAvailable" => info.available_kb = value,
            "MemFree" => info.free_kb = value,
            _ => {},
        }
    }
    info
}

/// Kernel thermal zones report millidegrees; some vendor drivers report degrees
fn read_zone_celsius(path: &Path) -> Option<f32> {
    let raw: f32 = fs::read_to_string(path).ok()?.trim().parse().ok()?;
    let celsius = if raw.abs() >= 1000.0 { raw / 1000.0 } else { raw };
    celsius.is_finite().then_some(celsius)
}

/// Fixed device readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticDeviceCapabilities {
    pub api_level: u32,
    pub board: String,
    pub total_memory_mb: u64,
    pub available_memory_mb: u64,
    pub temperature_celsius: f32,
}

impl StaticDeviceCapabilities {
    /// Readings matching `profile`, with half of total memory available
    pub fn from_profile(profile: &DeviceProfile) -> Self {
        Self {
            api_level: profile.api_level,
            board: profile.board.clone(),
            total_memory_mb: profile.total_memory_mb,
            available_memory_mb: profile.total_memory_mb / 2,
            temperature_celsius: profile.temperature_celsius,
        }
    }

    /// Override the available memory reading
    #[must_use]
    pub const fn with_available_memory_mb(mut self, available_memory_mb: u64) -> Self {
        self.available_memory_mb = available_memory_mb;
        self
    }
}

impl DeviceCapabilities for StaticDeviceCapabilities {
    fn api_level(&self) -> u32 {
        self.api_level
    }

    fn board(&self) -> String {
        self.board.clone()
    }

    fn total_memory_mb(&self) -> u64 {
        self.total_memory_mb
    }

    fn available_memory_mb(&self) -> u64 {
        self.available_memory_mb
    }

    fn temperature_celsius(&self) -> f32 {
        self.temperature_celsius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "\
MemTotal:        7812345 kB
MemFree:          812345 kB
MemAvailable:    3145728 kB
Buffers:          123456 kB
";

    fn fake_system() -> (tempfile::TempDir, SystemDeviceCapabilities) {
        let root = tempfile::tempdir().unwrap();
        let proc_root = root.path().join("proc");
        let sys_root = root.path().join("sys");
        fs::create_dir_all(proc_root.join("device-tree")).unwrap();
        fs::write(proc_root.join("meminfo"), MEMINFO).unwrap();
        fs::write(
            proc_root.join("device-tree").join("compatible"),
            b"qcom,sm8550-mtp\0qcom,kalama\0",
        )
        .unwrap();

        let thermal = sys_root.join("class").join("thermal");
        for (zone, temp) in [("thermal_zone0", "41500"), ("thermal_zone1", "67250")] {
            fs::create_dir_all(thermal.join(zone)).unwrap();
            fs::write(thermal.join(zone).join("temp"), temp).unwrap();
        }
        fs::create_dir_all(thermal.join("cooling_device0")).unwrap();

        let caps = SystemDeviceCapabilities::with_roots(proc_root, sys_root);
        (root, caps)
    }

    #[test]
    fn parses_meminfo_fields() {
        let info = parse_meminfo(MEMINFO);
        assert_eq!(info.total_kb, Some(7_812_345));
        assert_eq!(info.available_kb, Some(3_145_728));
        assert_eq!(info.free_kb, Some(812_345));
    }

    #[test]
    fn memory_in_mebibytes() {
        let (_root, caps) = fake_system();
        assert_eq!(caps.total_memory_mb(), 7_629);
        assert_eq!(caps.available_memory_mb(), 3_072);
    }

    #[test]
    fn available_falls_back_to_free() {
        let info = parse_meminfo("MemTotal: 2048000 kB\nMemFree: 1024000 kB\n");
        assert_eq!(info.available_kb, None);
        assert_eq!(info.available_kb.or(info.free_kb), Some(1_024_000));
    }

    #[test]
    fn hottest_thermal_zone_wins() {
        let (_root, caps) = fake_system();
        assert!((caps.temperature_celsius() - 67.25).abs() < 1e-3);
    }

    #[test]
    fn missing_sensors_read_as_ambient() {
        let root = tempfile::tempdir().unwrap();
        let caps = SystemDeviceCapabilities::with_roots(root.path(), root.path());
        assert!((caps.temperature_celsius() - DEFAULT_AMBIENT_CELSIUS).abs() < f32::EPSILON);
        assert_eq!(caps.total_memory_mb(), 0);
        assert_eq!(caps.board(), "unknown");
    }

    #[test]
    fn board_from_device_tree_soc_entry() {
        let (_root, caps) = fake_system();
        assert_eq!(caps.board(), "qcom,kalama");
    }

    #[test]
    fn board_from_cpuinfo_hardware_line() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join("cpuinfo"),
            "processor\t: 0\nHardware\t: Qualcomm Technologies, Inc SM8450\n",
        )
        .unwrap();
        let caps = SystemDeviceCapabilities::with_roots(root.path(), root.path());
        assert_eq!(caps.board(), "Qualcomm Technologies, Inc SM8450");
    }

    #[test]
    fn overrides_take_precedence() {
        let (_root, caps) = fake_system();
        let caps = caps.with_api_level(34).with_board("gs201");
        assert_eq!(caps.api_level(), 34);
        assert_eq!(caps.board(), "gs201");
    }

    #[test]
    fn degree_valued_zone_is_not_scaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        fs::write(&path, "45\n").unwrap();
        assert_eq!(read_zone_celsius(&path), Some(45.0));
    }

    #[test]
    fn static_capabilities_from_profile() {
        let profile = DeviceProfile::new(33, "sm8550", 8192, 36.0);
        let caps = StaticDeviceCapabilities::from_profile(&profile).with_available_memory_mb(700);
        assert_eq!(caps.api_level(), 33);
        assert_eq!(caps.total_memory_mb(), 8192);
        assert_eq!(caps.available_memory_mb(), 700);
        assert!((caps.temperature_celsius() - 36.0).abs() < f32::EPSILON);
    }

    #[test]
    fn static_capabilities_deserialize() {
        let json = r#"{"api_level":29,"board":"mt6893","total_memory_mb":6144,
            "available_memory_mb":2048,"temperature_celsius":40.0}"#;
        let caps: StaticDeviceCapabilities = serde_json::from_str(json).unwrap();
        assert_eq!(caps.board(), "mt6893");
        assert_eq!(caps.available_memory_mb(), 2048);
    }
}
