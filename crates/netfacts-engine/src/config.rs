//! Configuration file support for netfacts
//!
//! Loads and validates `netfacts.toml`. Every key has a default, so a missing
//! file is equivalent to an empty one.

use crate::error::{FactsError, FactsResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/netfacts/netfacts.toml";

/// Device access configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Login used for every device
    #[serde(default = "default_username")]
    pub username: String,

    /// Password used for every device
    #[serde(default = "default_password")]
    pub password: String,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Budget for one whole device visit in seconds
    #[serde(default = "default_device_timeout")]
    pub device_timeout_secs: u64,

    /// Driver arguments applied to every plan; plan arguments win on conflict
    #[serde(default)]
    pub global_args: serde_json::Map<String, serde_json::Value>,
}

/// Collector behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Interfaces whose names do not match are ignored by the MAC/IP collectors
    #[serde(default = "default_valid_interfaces_re")]
    pub valid_interfaces_re: String,

    /// Tag put on every object created by a collector
    #[serde(default = "default_auto_discovered_tag")]
    pub auto_discovered_tag: String,
}

/// ASN creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AsnConfig {
    /// Name of the RIR new ASNs are assigned to. ASNs are not created when unset.
    #[serde(default)]
    pub rir: Option<String>,
}

/// Logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
}

/// Complete netfacts configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactsConfig {
    #[serde(default)]
    pub driver: DriverConfig,

    #[serde(default)]
    pub collection: CollectionConfig,

    #[serde(default)]
    pub asn: AsnConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// Default functions
fn default_username() -> String {
    "netbox".to_string()
}

fn default_password() -> String {
    "netbox".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_device_timeout() -> u64 {
    300
}

fn default_valid_interfaces_re() -> String {
    "^(ge|xe|et|ae|irb|em|fxp|me|vlan|Ethernet|Port-Channel)".to_string()
}

fn default_auto_discovered_tag() -> String {
    "Automatically Discovered".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations
impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
            connect_timeout_secs: default_connect_timeout(),
            device_timeout_secs: default_device_timeout(),
            global_args: serde_json::Map::new(),
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            valid_interfaces_re: default_valid_interfaces_re(),
            auto_discovered_tag: default_auto_discovered_tag(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl FactsConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> FactsResult<Self> {
        toml::from_str(content)
            .map_err(|e| FactsError::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> FactsResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config = toml::from_str(&content).map_err(|e| {
                    FactsError::Configuration(format!(
                        "Failed to parse config file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                debug!(path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(FactsError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> FactsResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FactsError::Configuration(format!("Failed to serialize config: {}", e)))?;
        fs::write(path.as_ref(), content)
            .map_err(|e| FactsError::Configuration(format!("Failed to write config: {}", e)))
    }

    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.driver.connect_timeout_secs)
    }

    /// Get per-device timeout as Duration
    pub fn device_timeout(&self) -> Duration {
        Duration::from_secs(self.driver.device_timeout_secs)
    }

    /// Compiles the interface name filter.
    pub fn interfaces_regex(&self) -> FactsResult<Regex> {
        Regex::new(&self.collection.valid_interfaces_re).map_err(|e| {
            FactsError::Configuration(format!("valid_interfaces_re is not a valid regex: {}", e))
        })
    }

    /// Global driver arguments overlaid with `plan_args`.
    pub fn merged_driver_args(
        &self,
        plan_args: &serde_json::Map<String, serde_json::Value>,
    ) -> serde_json::Map<String, serde_json::Value> {
        let mut args = self.driver.global_args.clone();
        for (key, value) in plan_args {
            args.insert(key.clone(), value.clone());
        }
        args
    }

    /// Validate configuration
    pub fn validate(&self) -> FactsResult<()> {
        if self.driver.username.is_empty() {
            return Err(FactsError::Configuration(
                "driver.username must not be empty".to_string(),
            ));
        }

        if self.driver.connect_timeout_secs == 0 {
            return Err(FactsError::Configuration(
                "connect_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.driver.device_timeout_secs == 0 {
            return Err(FactsError::Configuration(
                "device_timeout_secs must be > 0".to_string(),
            ));
        }

        self.interfaces_regex()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = FactsConfig::default();
        assert_eq!(config.driver.username, "netbox");
        assert_eq!(config.driver.connect_timeout_secs, 30);
        assert_eq!(config.driver.device_timeout_secs, 300);
        assert_eq!(config.collection.auto_discovered_tag, "Automatically Discovered");
        assert_eq!(config.asn.rir, None);
        assert!(!config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = FactsConfig::from_toml(
            r#"
            [driver]
            username = "collector"
            device_timeout_secs = 60

            [asn]
            rir = "RFC 6996"
            "#,
        )
        .unwrap();

        assert_eq!(config.driver.username, "collector");
        assert_eq!(config.driver.password, "netbox");
        assert_eq!(config.device_timeout(), Duration::from_secs(60));
        assert_eq!(config.asn.rir.as_deref(), Some("RFC 6996"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_interfaces_regex_matches_prefix() {
        let re = FactsConfig::default().interfaces_regex().unwrap();
        assert!(re.is_match("xe-0/0/0.0"));
        assert!(re.is_match("irb.100"));
        assert!(!re.is_match("lo0.0"));
        assert!(!re.is_match("bme0"));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = FactsConfig::default();
        config.collection.valid_interfaces_re = "(".to_string();
        assert!(config.validate().is_err());

        let mut config = FactsConfig::default();
        config.driver.device_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = FactsConfig::default();
        config.driver.username.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_plan_args_override_global_args() {
        let mut config = FactsConfig::default();
        config.driver.global_args.insert("port".to_string(), json!(830));
        config.driver.global_args.insert("ssh_config_file".to_string(), json!("~/.ssh/config"));

        let mut plan_args = serde_json::Map::new();
        plan_args.insert("port".to_string(), json!(22));

        let merged = config.merged_driver_args(&plan_args);
        assert_eq!(merged["port"], json!(22));
        assert_eq!(merged["ssh_config_file"], json!("~/.ssh/config"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = FactsConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, FactsConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netfacts.toml");
        let mut config = FactsConfig::default();
        config.asn.rir = Some("ARIN".to_string());
        config.save(&path).unwrap();

        let loaded = FactsConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
