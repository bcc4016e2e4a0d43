//! Configuration management for plategate
//!
//! Config stored at: ~/.config/plategate/config.toml
//! Every setting has a default; a missing file means "all defaults".

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use plategate_domain::service::{DEFAULT_REGION_MARKER, DEFAULT_STABILIZER_THRESHOLD};
use plategate_infra::hardware::{GateDiscovery, DEFAULT_DEVICE_PATTERNS};
use plategate_infra::persistence::LedgerOptions;
use plategate_types::{ConfigError, Result};

use crate::station::DoubleEntryPolicy;

/// Station configuration, shared by the entry and exit processes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Pause between control loop iterations
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub validator: ValidatorConfig,

    #[serde(default)]
    pub stabilizer: StabilizerConfig,

    #[serde(default)]
    pub entry: EntryConfig,

    #[serde(default)]
    pub exit: ExitConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub sensor: SensorConfig,

    #[serde(default)]
    pub detector: DetectorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub path: PathBuf,
    pub lock_timeout_ms: u64,
    pub stale_lock_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Regional marker every accepted plate starts with
    pub marker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Readings per majority vote
    pub threshold: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    pub cooldown_secs: u64,
    pub double_entry: DoubleEntryPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitConfig {
    /// 0 sounds the alarm on every denial
    pub alarm_cooldown_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<PathBuf>,
    pub scan_dir: PathBuf,
    pub device_patterns: Vec<String>,
    pub settle_ms: u64,
    /// How long the barrier stays open
    pub dwell_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Prints the distance in cm; unset runs camera-only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub presence_threshold_cm: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Captures a frame and prints plate candidates as JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("plates_log.csv"),
            lock_timeout_ms: 5_000,
            stale_lock_secs: 30,
        }
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_REGION_MARKER.to_string(),
        }
    }
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_STABILIZER_THRESHOLD,
        }
    }
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 300,
            double_entry: DoubleEntryPolicy::default(),
        }
    }
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            alarm_cooldown_secs: 0,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            device: None,
            scan_dir: PathBuf::from("/dev"),
            device_patterns: DEFAULT_DEVICE_PATTERNS.iter().map(|p| p.to_string()).collect(),
            settle_ms: 2_000,
            dwell_secs: 15,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            command: None,
            presence_threshold_cm: 50.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            ledger: LedgerConfig::default(),
            validator: ValidatorConfig::default(),
            stabilizer: StabilizerConfig::default(),
            entry: EntryConfig::default(),
            exit: ExitConfig::default(),
            gate: GateConfig::default(),
            sensor: SensorConfig::default(),
            detector: DetectorConfig::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("plategate");
        Ok(config_dir)
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from `path` (or the default location), falling back to
    /// defaults when the file does not exist
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::from_toml(&content)
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        // Ensure directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Reject settings the stations cannot run with
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.validator.marker.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "validator.marker",
                reason: "must not be empty".to_string(),
            });
        }
        if self.stabilizer.threshold == 0 {
            return Err(ConfigError::Invalid {
                key: "stabilizer.threshold",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.sensor.presence_threshold_cm > 0.0) {
            return Err(ConfigError::Invalid {
                key: "sensor.presence_threshold_cm",
                reason: format!("must be positive, got {}", self.sensor.presence_threshold_cm),
            });
        }
        if self.ledger.path.as_os_str().is_empty() {
            return Err(ConfigError::Missing("ledger.path"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ledger_options(&self) -> LedgerOptions {
        LedgerOptions {
            lock_timeout: Duration::from_millis(self.ledger.lock_timeout_ms),
            stale_lock_after: Duration::from_secs(self.ledger.stale_lock_secs),
        }
    }

    pub fn gate_discovery(&self) -> GateDiscovery {
        GateDiscovery {
            device: self.gate.device.clone(),
            scan_dir: self.gate.scan_dir.clone(),
            patterns: self.gate.device_patterns.clone(),
            settle: Duration::from_millis(self.gate.settle_ms),
        }
    }

    pub fn dwell(&self) -> Duration {
        Duration::from_secs(self.gate.dwell_secs)
    }

    pub fn entry_cooldown(&self) -> chrono::Duration {
        secs(self.entry.cooldown_secs)
    }

    pub fn alarm_cooldown(&self) -> chrono::Duration {
        secs(self.exit.alarm_cooldown_secs)
    }
}

fn secs(value: u64) -> chrono::Duration {
    chrono::Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX).min(i64::MAX / 1_000))
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Plategate Configuration")?;
        writeln!(f, "=======================")?;
        writeln!(f)?;
        writeln!(f, "Ledger:            {}", self.ledger.path.display())?;
        writeln!(f, "Lock timeout:      {} ms", self.ledger.lock_timeout_ms)?;
        writeln!(f, "Plate marker:      {}", self.validator.marker)?;
        writeln!(f, "Readings/decision: {}", self.stabilizer.threshold)?;
        writeln!(f, "Entry cooldown:    {} s", self.entry.cooldown_secs)?;
        writeln!(f, "Double entry:      {}", self.entry.double_entry)?;
        writeln!(f, "Alarm cooldown:    {} s", self.exit.alarm_cooldown_secs)?;
        writeln!(
            f,
            "Gate device:       {}",
            self.gate
                .device
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| format!("(scan {})", self.gate.scan_dir.display()))
        )?;
        writeln!(f, "Gate dwell:        {} s", self.gate.dwell_secs)?;
        writeln!(
            f,
            "Sensor:            {}",
            self.sensor.command.as_deref().unwrap_or("(none, camera-only)")
        )?;
        writeln!(f, "Presence within:   {} cm", self.sensor.presence_threshold_cm)?;
        writeln!(
            f,
            "Detector:          {}",
            self.detector.command.as_deref().unwrap_or("(not set)")
        )?;
        writeln!(f, "Poll interval:     {} ms", self.poll_interval_ms)?;

        Ok(())
    }
}
