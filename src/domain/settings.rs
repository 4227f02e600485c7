use crate::domain::clamp::ClampPolicy;
use crate::domain::models::SensorIdentity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_true")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_true(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_true(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "dual_tilt_monitor".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

/// One tracked sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSettings {
    pub address: SensorIdentity,
    #[serde(default)]
    pub label: String,
    /// Indicator colour as RGB
    #[serde(default = "default_indicator_color")]
    pub color: [u8; 3],
}

/// Notification service UUID
pub const SERVICE_UUID: &str = "0000ffe5-0000-1000-8000-00805f9a34fb";

/// Notification characteristic UUID - where sensor frames are pushed
pub const NOTIFY_CHAR_UUID: &str = "0000ffe4-0000-1000-8000-00805f9a34fb";

fn default_indicator_color() -> [u8; 3] {
    [255, 50, 50]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_sensors")]
    pub sensors: Vec<SensorSettings>,

    // BLE Settings
    #[serde(default = "default_service_uuid")]
    pub ble_service_uuid: String,
    #[serde(default = "default_notify_uuid")]
    pub ble_notify_char_uuid: String,
    #[serde(default = "default_scan_duration_ms")]
    pub scan_duration_ms: u64,
    #[serde(default = "default_scan_stop_margin_ms")]
    pub scan_stop_margin_ms: u64,

    #[serde(default)]
    pub clamp: ClampPolicy,

    // Logging Settings
    #[serde(default)]
    pub log_settings: LogSettings,

    // Debug Settings
    #[serde(default = "default_false")]
    pub debug_raw_data_logging: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sensors: default_sensors(),
            ble_service_uuid: default_service_uuid(),
            ble_notify_char_uuid: default_notify_uuid(),
            scan_duration_ms: default_scan_duration_ms(),
            scan_stop_margin_ms: default_scan_stop_margin_ms(),
            clamp: ClampPolicy::default(),
            log_settings: LogSettings::default(),
            debug_raw_data_logging: false,
        }
    }
}

impl Settings {
    pub fn identities(&self) -> Vec<SensorIdentity> {
        self.sensors.iter().map(|s| s.address.clone()).collect()
    }

    pub fn scan_duration(&self) -> Duration {
        Duration::from_millis(self.scan_duration_ms)
    }

    pub fn scan_stop_margin(&self) -> Duration {
        Duration::from_millis(self.scan_stop_margin_ms)
    }
}

fn default_sensors() -> Vec<SensorSettings> {
    vec![
        SensorSettings {
            address: SensorIdentity::new("E8:96:68:03:A1:5E"),
            label: "Sensor 1".to_string(),
            color: [255, 50, 50],
        },
        SensorSettings {
            address: SensorIdentity::new("EE:29:F5:3F:06:A1"),
            label: "Sensor 2".to_string(),
            color: [255, 220, 0],
        },
    ]
}
fn default_service_uuid() -> String {
    SERVICE_UUID.to_string()
}
fn default_notify_uuid() -> String {
    NOTIFY_CHAR_UUID.to_string()
}
fn default_scan_duration_ms() -> u64 {
    2000
}
fn default_scan_stop_margin_ms() -> u64 {
    100
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Ok(Self::with_path(settings_path))
    }

    /// Load from `path`, falling back to defaults when missing or unreadable.
    pub fn with_path(settings_path: PathBuf) -> Self {
        let settings = match Self::load_from_file(&settings_path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::debug!(
                    "Using default settings ({}): {}",
                    settings_path.display(),
                    e
                );
                Settings::default()
            }
        };

        Self {
            settings,
            settings_path,
        }
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("DualTiltMonitor");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_sensor_protocol() {
        let s = Settings::default();
        assert_eq!(s.sensors.len(), 2);
        assert_eq!(s.identities()[0].as_str(), "E8:96:68:03:A1:5E");
        assert_eq!(s.identities()[1].as_str(), "EE:29:F5:3F:06:A1");
        assert_eq!(s.ble_service_uuid, "0000ffe5-0000-1000-8000-00805f9a34fb");
        assert_eq!(s.ble_notify_char_uuid, "0000ffe4-0000-1000-8000-00805f9a34fb");
        assert_eq!(s.scan_duration(), Duration::from_millis(2000));
        assert_eq!(s.scan_stop_margin(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let s: Settings = serde_json::from_str(
            r#"{"sensors":[{"address":"aa:bb:cc:dd:ee:ff"}],"scan_duration_ms":500}"#,
        )
        .unwrap();
        assert_eq!(s.sensors[0].address.as_str(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(s.sensors[0].color, [255, 50, 50]);
        assert_eq!(s.scan_duration_ms, 500);
        assert_eq!(s.log_settings.level, "info");
        assert_eq!(s.clamp, ClampPolicy::default());
    }

    #[test]
    fn test_missing_file_uses_defaults_and_save_roundtrips() {
        let dir = std::env::temp_dir().join(format!("dual_tilt_settings_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        let _ = fs::remove_file(&path);

        let service = SettingsService::with_path(path.clone());
        assert_eq!(service.get().scan_duration_ms, 2000);
        service.save().unwrap();
        assert!(path.exists());

        fs::write(&path, r#"{"scan_duration_ms":1500}"#).unwrap();
        let reloaded = SettingsService::with_path(path.clone());
        assert_eq!(reloaded.get().scan_duration_ms, 1500);
        assert_eq!(reloaded.get().sensors.len(), 2);

        fs::write(&path, "{ not json").unwrap();
        let broken = SettingsService::with_path(path);
        assert_eq!(broken.get().scan_duration_ms, 2000);

        let _ = fs::remove_dir_all(&dir);
    }
}
