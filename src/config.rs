//! Configuration.
//!
//! Everything the dashboard needs to know about its environment (API base
//! URL, poll cadence, which machines exist) lives in one [`Config`] value that
//! `main` builds once and hands to the components that need it.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults.
//! 2. A TOML file (`--config`, or the first of the default locations).
//! 3. Command-line flags (applied in `main`).
//!
//! ```toml
//! [api]
//! base_url = "http://172.18.7.93:9898"
//! poll_interval_ms = 5000
//! request_timeout_ms = 3000
//!
//! [[machines]]
//! id = 1
//! name = "Mazak H 500"
//!
//! [logging]
//! level = "debug"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::poll::DEFAULT_POLL_INTERVAL;

/// Numeric machine identifier used in the sensor API path.
pub type MachineId = u32;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default = "default_machines")]
    pub machines: Vec<Machine>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            machines: default_machines(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Sensor API settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// No timeout when unset.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

fn default_base_url() -> String {
    "http://172.18.7.93:9898".to_string()
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval(),
            request_timeout_ms: None,
        }
    }
}

/// A machine on the shop floor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
}

fn default_machines() -> Vec<Machine> {
    vec![
        Machine { id: 1, name: "Mazak H 500".to_string() },
        Machine { id: 2, name: "LT 500".to_string() },
    ]
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path.  The terminal belongs to the UI, so logs always go to a file.
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Configured file, or `cnc-monitor.log` in the platform data directory.
    pub fn file_path(&self) -> PathBuf {
        self.file.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|p| p.join("cnc-monitor"))
                .unwrap_or_else(|| PathBuf::from("."))
                .join("cnc-monitor.log")
        })
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// First existing file among the default locations.
    pub fn locate() -> Option<PathBuf> {
        let candidates = [
            dirs::config_dir().map(|p| p.join("cnc-monitor").join("config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];
        candidates.into_iter().flatten().find(|p| p.exists())
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "api.poll_interval_ms must be greater than zero".into(),
            ));
        }
        if self.api.request_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "api.request_timeout_ms must be greater than zero".into(),
            ));
        }
        reqwest::Url::parse(&self.api.base_url).map_err(|e| {
            ConfigError::Invalid(format!("api.base_url {:?}: {e}", self.api.base_url))
        })?;
        if self.machines.is_empty() {
            return Err(ConfigError::Invalid("at least one machine is required".into()));
        }
        let mut seen = HashSet::new();
        for machine in &self.machines {
            if !seen.insert(machine.id) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate machine id {}",
                    machine.id
                )));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.api.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.api.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn machine_name(&self, id: MachineId) -> Option<&str> {
        self.machines
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.name.as_str())
    }

    /// Machines ordered by id.
    pub fn machine_list(&self) -> Vec<Machine> {
        let mut machines = self.machines.clone();
        machines.sort_by_key(|m| m.id);
        machines
    }
}

/// `{base_url}/sensor_data/{id}`, tolerating a trailing slash on the base.
pub fn sensor_url(base_url: &str, id: MachineId) -> String {
    format!("{}/sensor_data/{id}", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://172.18.7.93:9898");
        assert_eq!(config.poll_interval(), Duration::from_millis(5000));
        assert!(config.request_timeout().is_none());
        assert_eq!(config.machine_name(1), Some("Mazak H 500"));
        assert_eq!(config.machine_name(2), Some("LT 500"));
        assert_eq!(config.machine_name(3), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sensor_url_joins_base_and_id() {
        let config = Config::default();
        assert_eq!(
            sensor_url(&config.api.base_url, 1),
            "http://172.18.7.93:9898/sensor_data/1"
        );
        assert_eq!(sensor_url("http://host/", 7), "http://host/sensor_data/7");
    }

    #[test]
    fn parses_full_file() {
        let config = Config::parse(
            r#"
            [api]
            base_url = "http://localhost:9898"
            poll_interval_ms = 1000
            request_timeout_ms = 250

            [[machines]]
            id = 5
            name = "HMT VTC 800"

            [[machines]]
            id = 3
            name = "Schaublin"

            [logging]
            level = "debug"
            file = "/tmp/cnc.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:9898");
        assert_eq!(config.poll_interval(), Duration::from_millis(1000));
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file_path(), PathBuf::from("/tmp/cnc.log"));

        let ids: Vec<_> = config.machine_list().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 5], "machine list is sorted by id");
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = Config::parse("[api]\npoll_interval_ms = 2000\n").unwrap();
        assert_eq!(config.api.base_url, "http://172.18.7.93:9898");
        assert_eq!(config.poll_interval(), Duration::from_millis(2000));
        assert_eq!(config.machines.len(), 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.api.poll_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.api.base_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let mut config = Config::default();
        config.machines.push(Machine { id: 1, name: "Copy".into() });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate machine id 1"));
    }

    #[test]
    fn validate_rejects_empty_machine_list() {
        let mut config = Config::default();
        config.machines.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"http://10.0.0.1:9898\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.api.base_url, "http://10.0.0.1:9898");
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nbroken").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/cnc-monitor.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
