//! Configuration loading for the nodedeck TUI.
//!
//! All fields are required unless explicitly marked optional. No defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nodedeck_core::{DataType, DeviceId};
use nodedeck_storage::TtlPolicy;
use serde::Deserialize;

/// Largest LMDB map the cache may ask for (64 GiB).
const MAX_CACHE_SIZE_MB: usize = 64 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TuiConfig {
    pub devices: Vec<DeviceConfig>,
    pub auth: AuthConfig,
    pub request_timeout_ms: u64,
    pub tick_interval_ms: u64,
    pub cache: CacheConfig,
    pub persistence_path: PathBuf,
    pub log_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    pub id: String,
    pub name: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub max_size_mb: usize,
    /// When set, replaces the built-in per-type TTLs with one value.
    pub default_ttl_secs: Option<u64>,
    /// Per data type overrides keyed by snake_case name, e.g. `power_ranking`.
    #[serde(default)]
    pub ttl_secs: HashMap<String, u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or NODEDECK_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] nodedeck_core::ConfigError),
}

impl TuiConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: TuiConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), nodedeck_core::ConfigError> {
        if self.devices.is_empty() {
            return Err(nodedeck_core::ConfigError::MissingRequired {
                field: "devices".to_string(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for (idx, device) in self.devices.iter().enumerate() {
            if DeviceId::new(device.id.as_str()).is_none() {
                return Err(invalid(
                    format!("devices[{}].id", idx),
                    "must not be empty",
                ));
            }
            if !seen.insert(device.id.trim()) {
                return Err(invalid(
                    format!("devices[{}].id", idx),
                    "duplicate device id",
                ));
            }
            if device.base_url.trim().is_empty() {
                return Err(invalid(
                    format!("devices[{}].base_url", idx),
                    "must not be empty",
                ));
            }
            if !device.base_url.starts_with("http://") && !device.base_url.starts_with("https://")
            {
                return Err(invalid(
                    format!("devices[{}].base_url", idx),
                    "must start with http:// or https://",
                ));
            }
        }
        if let Some(token) = &self.auth.bearer_token {
            if token.trim().is_empty() {
                return Err(invalid("auth.bearer_token", "must not be empty when set"));
            }
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid("request_timeout_ms", "must be > 0"));
        }
        if self.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms", "must be > 0"));
        }
        if self.cache.enabled && self.cache.path.as_os_str().is_empty() {
            return Err(invalid("cache.path", "must not be empty"));
        }
        if self.cache.max_size_mb == 0 {
            return Err(invalid("cache.max_size_mb", "must be > 0"));
        }
        if self.cache.max_size_mb > MAX_CACHE_SIZE_MB {
            return Err(invalid(
                "cache.max_size_mb",
                &format!("must be <= {}", MAX_CACHE_SIZE_MB),
            ));
        }
        if self.cache.default_ttl_secs == Some(0) {
            return Err(invalid("cache.default_ttl_secs", "must be > 0"));
        }
        for (name, secs) in &self.cache.ttl_secs {
            if data_type_from_name(name).is_none() {
                return Err(invalid(
                    format!("cache.ttl_secs.{}", name),
                    "unknown data type",
                ));
            }
            if *secs == 0 {
                return Err(invalid(format!("cache.ttl_secs.{}", name), "must be > 0"));
            }
        }
        if self.persistence_path.as_os_str().is_empty() {
            return Err(invalid("persistence_path", "must not be empty"));
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(invalid("log_path", "must not be empty"));
        }
        Ok(())
    }

    /// Built-in per-type TTLs (or the configured default), then overrides.
    pub fn ttl_policy(&self) -> TtlPolicy {
        let mut policy = match self.cache.default_ttl_secs {
            Some(secs) => TtlPolicy::new().with_default(Duration::from_secs(secs)),
            None => TtlPolicy::default(),
        };
        for (name, secs) in &self.cache.ttl_secs {
            if let Some(data_type) = data_type_from_name(name) {
                policy = policy.with_ttl(data_type, Duration::from_secs(*secs));
            }
        }
        policy
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.devices
            .iter()
            .filter_map(|d| DeviceId::new(d.id.as_str()))
            .collect()
    }

    pub fn device(&self, id: &DeviceId) -> Option<&DeviceConfig> {
        self.devices.iter().find(|d| d.id.trim() == id.as_str())
    }
}

fn invalid(field: impl Into<String>, reason: &str) -> nodedeck_core::ConfigError {
    nodedeck_core::ConfigError::InvalidValue {
        field: field.into(),
        reason: reason.to_string(),
    }
}

fn data_type_from_name(name: &str) -> Option<DataType> {
    DataType::all().iter().copied().find(|dt| dt.name() == name)
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("NODEDECK_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
