//! clinic-flow configuration
//!
//! Each setting resolves: command-line argument, then `CLINIC_FLOW_*`
//! environment variable, then the TOML file, then the compiled default.

use crate::models::TransitionPolicy;
use clap::Parser;
use clinic_common::config::{default_config_path, default_data_dir, layered, TomlConfig};
use clinic_common::time::ServiceDay;
use clinic_common::{Error, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const MODULE_NAME: &str = "clinic-flow";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5760";
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Command-line arguments for clinic-flow
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "clinic-flow")]
#[command(about = "Patient flow and room orchestration service")]
#[command(version)]
pub struct Args {
    /// TOML config file
    #[arg(short, long, env = "CLINIC_FLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// HTTP listen address
    #[arg(long, env = "CLINIC_FLOW_BIND_ADDR")]
    pub bind_addr: Option<SocketAddr>,

    /// SQLite database file
    #[arg(long, env = "CLINIC_FLOW_DATABASE_PATH")]
    pub database_path: Option<PathBuf>,

    /// Live event channel capacity
    #[arg(long, env = "CLINIC_FLOW_EVENT_CAPACITY")]
    pub event_capacity: Option<usize>,

    /// UTC offset in minutes defining the clinic's calendar day
    #[arg(long, env = "CLINIC_FLOW_DAY_OFFSET_MINUTES", allow_hyphen_values = true)]
    pub day_offset_minutes: Option<i32>,

    /// Reject out-of-order status transitions
    #[arg(long, env = "CLINIC_FLOW_ENFORCE_TRANSITION_ORDER")]
    pub enforce_transition_order: Option<bool>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, env = "CLINIC_FLOW_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub event_capacity: usize,
    pub service_day: ServiceDay,
    pub transition_policy: TransitionPolicy,
    pub log_level: String,
}

impl FlowConfig {
    /// Resolve from arguments plus the config file they (or the default path) point at
    pub fn resolve(args: &Args) -> Result<Self> {
        let config_path = args
            .config
            .clone()
            .or_else(|| default_config_path(MODULE_NAME));
        let toml = TomlConfig::load_optional(config_path.as_deref())?;
        Self::from_layers(args, &toml)
    }

    /// Combine already-parsed arguments and TOML
    pub fn from_layers(args: &Args, toml: &TomlConfig) -> Result<Self> {
        let toml_bind_addr = toml
            .bind_addr
            .as_deref()
            .map(|addr| {
                addr.parse::<SocketAddr>()
                    .map_err(|e| Error::Config(format!("Invalid bind_addr '{}': {}", addr, e)))
            })
            .transpose()?;
        let default_bind_addr: SocketAddr = DEFAULT_BIND_ADDR
            .parse()
            .map_err(|e| Error::Config(format!("Invalid default bind address: {}", e)))?;

        let event_capacity = layered(args.event_capacity, toml.event_capacity, DEFAULT_EVENT_CAPACITY);
        if event_capacity == 0 {
            return Err(Error::Config("event_capacity must be greater than 0".to_string()));
        }

        let day_offset = layered(args.day_offset_minutes, toml.day_offset_minutes, 0);

        Ok(Self {
            bind_addr: layered(args.bind_addr, toml_bind_addr, default_bind_addr),
            database_path: layered(
                args.database_path.clone(),
                toml.database_path.clone(),
                default_data_dir(MODULE_NAME).join("clinic.db"),
            ),
            event_capacity,
            service_day: ServiceDay::new(day_offset)?,
            transition_policy: TransitionPolicy::from_enforced(layered(
                args.enforce_transition_order,
                toml.enforce_transition_order,
                false,
            )),
            log_level: layered(
                args.log_level.clone(),
                toml.log_level.clone(),
                DEFAULT_LOG_LEVEL.to_string(),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let config = FlowConfig::from_layers(&Args::default(), &TomlConfig::default()).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert_eq!(config.transition_policy, TransitionPolicy::Permissive);
        assert!(config.database_path.ends_with("clinic-flow/clinic.db"));
    }

    #[test]
    fn test_cli_beats_toml() {
        let toml = TomlConfig::parse(
            "bind_addr = \"0.0.0.0:9000\"\nevent_capacity = 50\nenforce_transition_order = true\n",
        )
        .unwrap();
        let args = Args {
            event_capacity: Some(10),
            ..Default::default()
        };

        let config = FlowConfig::from_layers(&args, &toml).unwrap();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:9000");
        assert_eq!(config.event_capacity, 10);
        assert_eq!(config.transition_policy, TransitionPolicy::Ordered);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let toml = TomlConfig::parse("bind_addr = \"not an address\"").unwrap();
        assert!(matches!(
            FlowConfig::from_layers(&Args::default(), &toml),
            Err(Error::Config(_))
        ));

        let args = Args {
            event_capacity: Some(0),
            ..Default::default()
        };
        assert!(FlowConfig::from_layers(&args, &TomlConfig::default()).is_err());
    }

    #[test]
    #[serial]
    fn test_env_var_layer() {
        std::env::set_var("CLINIC_FLOW_DAY_OFFSET_MINUTES", "-300");
        std::env::set_var("CLINIC_FLOW_ENFORCE_TRANSITION_ORDER", "true");

        let args = Args::try_parse_from(["clinic-flow"]).unwrap();

        std::env::remove_var("CLINIC_FLOW_DAY_OFFSET_MINUTES");
        std::env::remove_var("CLINIC_FLOW_ENFORCE_TRANSITION_ORDER");

        assert_eq!(args.day_offset_minutes, Some(-300));
        assert_eq!(args.enforce_transition_order, Some(true));
    }

    #[test]
    #[serial]
    fn test_argument_overrides_env() {
        std::env::set_var("CLINIC_FLOW_EVENT_CAPACITY", "64");
        let args = Args::try_parse_from(["clinic-flow", "--event-capacity", "128"]).unwrap();
        std::env::remove_var("CLINIC_FLOW_EVENT_CAPACITY");

        assert_eq!(args.event_capacity, Some(128));
    }
}
