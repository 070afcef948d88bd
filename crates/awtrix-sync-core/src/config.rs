use crate::engine::EngineOptions;
use crate::error::Result;
use crate::io::read_optional;
use crate::paths;
use crate::pending::ReplayMode;
use crate::productive::ProductiveConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// DeviceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Host or `host:port` of the display. Required.
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_device_timeout")]
    pub timeout_secs: u64,
}

fn default_device_timeout() -> u64 {
    5
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            timeout_secs: default_device_timeout(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    /// Where `known_apps.json` and the pending buffer live.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    #[serde(default = "default_apps_dir")]
    pub apps_dir: PathBuf,
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_producer_timeout")]
    pub producer_timeout_secs: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub replay: ReplayMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub productive: Option<ProductiveConfig>,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_apps_dir() -> PathBuf {
    PathBuf::from(".").join(paths::APPS_DIR)
}

fn default_interval() -> u64 {
    600
}

fn default_producer_timeout() -> u64 {
    10
}

fn default_concurrency() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            state_dir: default_state_dir(),
            apps_dir: default_apps_dir(),
            interval_secs: default_interval(),
            producer_timeout_secs: default_producer_timeout(),
            concurrency: default_concurrency(),
            replay: ReplayMode::default(),
            productive: None,
        }
    }
}

impl Config {
    /// Load from a YAML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match read_optional(path)? {
            Some(data) if !data.trim().is_empty() => Ok(serde_yaml::from_str(&data)?),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn device_timeout(&self) -> Duration {
        Duration::from_secs(self.device.timeout_secs)
    }

    pub fn known_units_path(&self) -> PathBuf {
        paths::known_units_path(&self.state_dir)
    }

    pub fn pending_path(&self) -> PathBuf {
        paths::pending_path(&self.state_dir)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            producer_timeout: Duration::from_secs(self.producer_timeout_secs),
            concurrency: self.concurrency.max(1),
            replay: self.replay,
        }
    }

    /// The productive section, only when both credentials are present.
    pub fn productive_enabled(&self) -> Option<&ProductiveConfig> {
        self.productive.as_ref().filter(|p| p.is_enabled())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.device.address.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "device address is missing: set AWTRIX_IP or device.address".to_string(),
            });
        }

        if self.interval_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "interval_secs must be greater than zero".to_string(),
            });
        }

        if self.device.timeout_secs == 0 || self.producer_timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "a zero timeout makes every call fail immediately".to_string(),
            });
        }

        if self.concurrency == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "concurrency 0 is treated as 1".to_string(),
            });
        }

        if let Some(p) = &self.productive {
            if !p.is_enabled() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "productive section present but api_key or org_id is empty; \
                              report widget disabled"
                        .to_string(),
                });
            }
            if p.fields.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "productive.fields is empty; the report widget will be blank"
                        .to_string(),
                });
            }
        }

        warnings
    }

    pub fn has_errors(warnings: &[ConfigWarning]) -> bool {
        warnings.iter().any(|w| w.level == WarnLevel::Error)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
