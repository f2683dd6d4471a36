//! Configuration loading and default path resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (handled by clap `env` attributes in each binary)
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// On-disk TOML configuration
///
/// Every field is optional; absent fields fall through to compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// HTTP listen address, e.g. "127.0.0.1:5760"
    pub bind_addr: Option<String>,
    /// SQLite database file
    pub database_path: Option<PathBuf>,
    /// EventBus channel capacity
    pub event_capacity: Option<usize>,
    /// UTC offset (minutes) that defines the clinic's calendar day
    pub day_offset_minutes: Option<i32>,
    /// Reject out-of-order status transitions
    pub enforce_transition_order: Option<bool>,
    /// Default tracing filter level
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a config file if one exists
    ///
    /// A missing file is not an error: a warning is logged and defaults apply.
    /// A file that exists but does not parse is an error.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!("Config file not found: {} (using defaults)", path.display());
            return Ok(Self::default());
        }

        let config = Self::load(path)?;
        info!("Loaded config file: {}", path.display());
        Ok(config)
    }
}

/// Pick the first available value: CLI/env, then TOML, then the compiled default
pub fn layered<T>(cli: Option<T>, toml: Option<T>, default: T) -> T {
    cli.or(toml).unwrap_or(default)
}

/// Default config file location for a module
///
/// Linux: `~/.config/clinic/<module>.toml`, falling back to `/etc/clinic/<module>.toml`
/// when only the system file exists. Other platforms use the platform config dir.
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    let file_name = format!("{}.toml", module_name);
    let user_config = dirs::config_dir().map(|d| d.join("clinic").join(&file_name));

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/clinic").join(&file_name);
        if let Some(path) = user_config.as_ref().filter(|p| p.exists()) {
            return Some(path.clone());
        }
        if system_config.exists() {
            return Some(system_config);
        }
    }

    user_config
}

/// Default data folder for a module's database
pub fn default_data_dir(module_name: &str) -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("clinic").join(module_name))
        .unwrap_or_else(|| PathBuf::from("./clinic_data").join(module_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layered_priority() {
        assert_eq!(layered(Some(1), Some(2), 3), 1);
        assert_eq!(layered(None, Some(2), 3), 2);
        assert_eq!(layered::<i32>(None, None, 3), 3);
    }

    #[test]
    fn test_parse_partial_config() {
        let config = TomlConfig::parse("bind_addr = \"0.0.0.0:9000\"\nday_offset_minutes = -300\n").unwrap();
        assert_eq!(config.bind_addr.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(config.day_offset_minutes, Some(-300));
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let err = TomlConfig::parse("bind_adr = \"x\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_default_data_dir_mentions_module() {
        let dir = default_data_dir("clinic-flow");
        assert!(dir.ends_with("clinic-flow"));
    }
}
