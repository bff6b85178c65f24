//! Configuration for the state monitor agent.

use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Smallest stack handed to an OS thread. Embedded-sized budgets from the
/// config are raised to this on hosted targets.
pub const MIN_THREAD_STACK: usize = 64 * 1024;

/// Main configuration for the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Which reading sources each manager is built with
    pub scenario: Scenario,

    /// Seed for simulated sensors; entropy when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Status reports buffered between drivers and the reporter
    pub report_capacity: usize,

    /// Independent driving contexts
    pub drivers: Vec<DriverConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scenario: Scenario::Ambient,
            seed: None,
            report_capacity: 1024,
            drivers: vec![
                DriverConfig::new("StateMon", Duration::from_secs(2))
                    .with_core(0)
                    .with_stack_size(4096)
                    .with_priority(5),
                DriverConfig::new("SensorProc", Duration::from_secs(1))
                    .with_core(1)
                    .with_stack_size(4096)
                    .with_priority(6)
                    .with_managers(3),
                DriverConfig::new("StateMon2", Duration::from_secs(2)).with_priority(5),
            ],
        }
    }
}

impl Config {
    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("state-monitor")
            .join("config.json")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.drivers.is_empty() {
            return Err(ConfigError::Invalid("at least one driver is required".into()));
        }
        if self.report_capacity == 0 {
            return Err(ConfigError::Invalid("report_capacity must be positive".into()));
        }
        for driver in &self.drivers {
            if driver.tick_interval.is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "driver '{}' has a zero tick interval",
                    driver.name
                )));
            }
            if driver.managers == 0 {
                return Err(ConfigError::Invalid(format!(
                    "driver '{}' drives no managers",
                    driver.name
                )));
            }
        }
        Ok(())
    }
}

/// Construction parameters for one driving context.
///
/// Only `name`, `stack_size` and `tick_interval` affect how the driver runs;
/// `core_id` and `priority` are placement hints carried for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    pub name: String,

    /// Preferred processor; any core when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_id: Option<usize>,

    /// Stack budget in bytes; platform default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_size: Option<usize>,

    pub priority: u8,

    #[serde(with = "duration_ms")]
    pub tick_interval: Duration,

    /// Managers owned by this driver
    pub managers: usize,
}

impl DriverConfig {
    pub fn new(name: impl Into<String>, tick_interval: Duration) -> Self {
        Self {
            name: name.into(),
            core_id: None,
            stack_size: None,
            priority: 1,
            tick_interval,
            managers: 1,
        }
    }

    pub fn with_core(mut self, core_id: usize) -> Self {
        self.core_id = Some(core_id);
        self
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_managers(mut self, managers: usize) -> Self {
        self.managers = managers;
        self
    }

    /// Stack size to request from the OS, if any.
    pub fn thread_stack_size(&self) -> Option<usize> {
        self.stack_size.map(|bytes| bytes.max(MIN_THREAD_STACK))
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration as whole milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("state-monitor-config-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn default_config_mirrors_stock_deployment() {
        let config = Config::default();
        assert_eq!(config.drivers.len(), 3);
        assert_eq!(config.drivers[0].name, "StateMon");
        assert_eq!(config.drivers[0].core_id, Some(0));
        assert_eq!(config.drivers[1].managers, 3);
        assert_eq!(config.drivers[1].tick_interval, Duration::from_secs(1));
        assert_eq!(config.drivers[2].core_id, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn stack_is_floored_for_os_threads() {
        let driver = DriverConfig::new("t", Duration::from_millis(10)).with_stack_size(4096);
        assert_eq!(driver.thread_stack_size(), Some(MIN_THREAD_STACK));

        let large = DriverConfig::new("t", Duration::from_millis(10)).with_stack_size(1 << 20);
        assert_eq!(large.thread_stack_size(), Some(1 << 20));

        assert_eq!(DriverConfig::new("t", Duration::from_millis(10)).thread_stack_size(), None);
    }

    #[test]
    fn tick_interval_serializes_as_millis() {
        let driver = DriverConfig::new("fast", Duration::from_millis(250));
        let json = serde_json::to_value(&driver).unwrap();
        assert_eq!(json["tick_interval"], 250);
        assert!(json.get("core_id").is_none());
    }

    #[test]
    fn validate_rejects_bad_drivers() {
        let mut config = Config::default();
        config.drivers[0].tick_interval = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.drivers[1].managers = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            drivers: Vec::new(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn save_then_load_from_path() {
        let path = temp_config_path("roundtrip.json");
        let config = Config {
            scenario: Scenario::Cycle,
            seed: Some(9),
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = temp_config_path("does-not-exist.json");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }
}
