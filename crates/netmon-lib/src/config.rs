//! Monitor configuration
//!
//! Loaded once at startup from a config file (JSON by default) overlaid by
//! `NETMON__*` environment variables, then passed by value into the loop.

use crate::error::ConfigError;
use crate::models::Thresholds;
use crate::probe::ProbeConfig;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "NETMON_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub thresholds: Thresholds,
    /// Sampling window length in seconds
    pub time_interval_secs: u64,
    pub show_graphs: bool,
    pub save_graphs: bool,
    /// Echo every cycle to stdout and log at debug level
    pub dev_mode: bool,
    pub graphs_dir: PathBuf,
    /// Append JSON logs to this file as well as stderr
    pub log_file: Option<PathBuf>,
    /// Serve health and metrics on this port when set
    pub metrics_port: Option<u16>,
    pub probe: ProbeConfig,
}

/// Document shape before flag validation
///
/// Flags stay untyped here so a JSON boolean is seen as one and rejected.
#[derive(Debug, Deserialize)]
struct RawConfig {
    low_limit: f64,
    high_limit: f64,
    time_interval: u64,
    show_graphs: Value,
    save_graphs: Value,
    dev_mode: Value,
    #[serde(default = "default_graphs_dir")]
    graphs_dir: PathBuf,
    #[serde(default)]
    log_file: Option<PathBuf>,
    #[serde(default)]
    metrics_port: Option<u16>,
    #[serde(default)]
    probe: ProbeConfig,
}

fn default_graphs_dir() -> PathBuf {
    PathBuf::from("graphs")
}

impl MonitorConfig {
    /// Load from the file named by `NETMON_CONFIG` (or `config.json`) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(Path::new(&path)))
            .add_source(::config::Environment::with_prefix("NETMON").separator("__"))
            .build()?;

        Self::from_settings(settings)
    }

    /// Load from a single file, ignoring the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path.as_ref()))
            .build()?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: ::config::Config) -> Result<Self, ConfigError> {
        let raw: RawConfig = settings.try_deserialize()?;
        Self::from_raw(raw)
    }

    /// Length of one sampling window
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.time_interval_secs)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        if !raw.low_limit.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: "low_limit",
                reason: "must be a finite number".to_string(),
            });
        }
        if !raw.high_limit.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: "high_limit",
                reason: "must be a finite number".to_string(),
            });
        }
        if raw.probe.connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "probe.connections",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            thresholds: Thresholds::new(raw.low_limit, raw.high_limit),
            time_interval_secs: raw.time_interval,
            show_graphs: read_flag("show_graphs", &raw.show_graphs)?,
            save_graphs: read_flag("save_graphs", &raw.save_graphs)?,
            dev_mode: read_flag("dev_mode", &raw.dev_mode)?,
            graphs_dir: raw.graphs_dir,
            log_file: raw.log_file,
            metrics_port: raw.metrics_port,
            probe: raw.probe,
        })
    }
}

/// Accept exactly `"true"` or `"false"`
pub fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ConfigError::InvalidFlag {
            key,
            value: format!("{:?}", other),
        }),
    }
}

/// Flags must be JSON strings; `true` or `1` are not accepted
fn read_flag(key: &'static str, value: &Value) -> Result<bool, ConfigError> {
    match value {
        Value::String(text) => parse_flag(key, text),
        other => Err(ConfigError::InvalidFlag {
            key,
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio_test::{assert_err, assert_ok};

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_flag() {
        assert!(assert_ok!(parse_flag("dev_mode", "true")));
        assert!(!assert_ok!(parse_flag("dev_mode", "false")));
        assert_err!(parse_flag("dev_mode", "True"));
        assert_err!(parse_flag("dev_mode", "FALSE"));
        assert_err!(parse_flag("dev_mode", "yes"));
        assert_err!(parse_flag("dev_mode", ""));
    }

    #[test]
    fn test_load_minimal_config() {
        let file = write_config(
            r#"{
                "low_limit": 5,
                "high_limit": 50.5,
                "time_interval": 60,
                "show_graphs": "false",
                "save_graphs": "true",
                "dev_mode": "false"
            }"#,
        );

        let config = MonitorConfig::load_from(file.path()).unwrap();

        assert_eq!(config.thresholds, Thresholds::new(5.0, 50.5));
        assert_eq!(config.window_duration(), Duration::from_secs(60));
        assert!(!config.show_graphs);
        assert!(config.save_graphs);
        assert!(!config.dev_mode);
        assert_eq!(config.graphs_dir, PathBuf::from("graphs"));
        assert_eq!(config.metrics_port, None);
        assert_eq!(config.probe.connections, 4);
        assert!(!config.probe.servers.is_empty());
    }

    #[test]
    fn test_wrong_case_flag_is_rejected() {
        let file = write_config(
            r#"{
                "low_limit": 5,
                "high_limit": 50,
                "time_interval": 60,
                "show_graphs": "True",
                "save_graphs": "false",
                "dev_mode": "false"
            }"#,
        );

        let err = MonitorConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidFlag { key: "show_graphs", .. }
        ));
    }

    #[test]
    fn test_boolean_literal_flag_is_rejected() {
        let file = write_config(
            r#"{
                "low_limit": 5,
                "high_limit": 50,
                "time_interval": 60,
                "show_graphs": true,
                "save_graphs": "false",
                "dev_mode": "false"
            }"#,
        );

        let err = MonitorConfig::load_from(file.path()).unwrap_err();
        match err {
            ConfigError::InvalidFlag { key, value } => {
                assert_eq!(key, "show_graphs");
                assert_eq!(value, "true");
            }
            other => panic!("expected InvalidFlag, got {other:?}"),
        }
    }

    #[test]
    fn test_read_flag_accepts_only_strings() {
        assert!(assert_ok!(read_flag("dev_mode", &Value::from("true"))));
        assert!(!assert_ok!(read_flag("dev_mode", &Value::from("false"))));
        assert_err!(read_flag("dev_mode", &Value::Bool(true)));
        assert_err!(read_flag("dev_mode", &Value::Bool(false)));
        assert_err!(read_flag("dev_mode", &Value::from(1)));
        assert_err!(read_flag("dev_mode", &Value::Null));
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let file = write_config(
            r#"{
                "low_limit": 5,
                "time_interval": 60,
                "show_graphs": "false",
                "save_graphs": "false",
                "dev_mode": "false"
            }"#,
        );

        let err = MonitorConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_optional_sections() {
        let file = write_config(
            r#"{
                "low_limit": 1,
                "high_limit": 2,
                "time_interval": 5,
                "show_graphs": "true",
                "save_graphs": "false",
                "dev_mode": "true",
                "graphs_dir": "/tmp/netmon-graphs",
                "metrics_port": 9100,
                "probe": {
                    "connections": 2,
                    "servers": [
                        {
                            "name": "local",
                            "download_url": "http://127.0.0.1:8000/down",
                            "upload_url": "http://127.0.0.1:8000/up"
                        }
                    ]
                }
            }"#,
        );

        let config = MonitorConfig::load_from(file.path()).unwrap();

        assert!(config.dev_mode);
        assert_eq!(config.graphs_dir, PathBuf::from("/tmp/netmon-graphs"));
        assert_eq!(config.metrics_port, Some(9100));
        assert_eq!(config.probe.connections, 2);
        assert_eq!(config.probe.servers.len(), 1);
        assert_eq!(config.probe.servers[0].name, "local");
    }

    #[test]
    fn test_zero_connections_rejected() {
        let file = write_config(
            r#"{
                "low_limit": 1,
                "high_limit": 2,
                "time_interval": 5,
                "show_graphs": "false",
                "save_graphs": "false",
                "dev_mode": "false",
                "probe": { "connections": 0 }
            }"#,
        );

        let err = MonitorConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: "probe.connections", .. }
        ));
    }
}
