use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::common::ConfigurationError;

/// Prefix of environment variables overriding file values, e.g.
/// `FLEET_DISPATCH__DISPATCHER__MAX_ROUTES_TO_CONSIDER=3`.
pub const ENV_PREFIX: &str = "FLEET_DISPATCH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dispatcher: DispatcherConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Keys ranking vehicles, highest precedence first.
    pub vehicle_priorities: Vec<String>,
    /// Keys ranking transport orders, highest precedence first.
    pub order_priorities: Vec<String>,
    pub vehicle_candidate_priorities: Vec<String>,
    pub order_candidate_priorities: Vec<String>,
    pub deadline_at_risk_period_ms: u64,
    /// How long a vehicle must have been idle before it is sent to recharge.
    pub recharge_idle_delay_ms: u64,
    pub max_routes_to_consider: usize,
    pub reroute_on_drive_order_finished: bool,
    pub recharge_idle_vehicles: bool,
    pub park_idle_vehicles: bool,
    pub repark_idle_vehicles: bool,
    pub park_operation: String,
    /// Period of the timer-driven dispatch; 0 disables it.
    pub dispatch_interval_ms: u64,
    pub avoid_resources_allocated_by_others: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. "info,fleet_dispatch=debug".
    pub filter: String,
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Layered loading: defaults, then the (optional) TOML file, then environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path.as_ref()).required(false))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }
}

impl DispatcherConfig {
    pub fn deadline_at_risk_period(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.deadline_at_risk_period_ms as i64)
    }

    pub fn recharge_idle_delay(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.recharge_idle_delay_ms as i64)
    }

    pub fn dispatch_interval(&self) -> Option<Duration> {
        (self.dispatch_interval_ms > 0).then(|| Duration::from_millis(self.dispatch_interval_ms))
    }

    /// Checks the scalar settings. Priority keys are checked by the comparator builder.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_routes_to_consider == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "max_routes_to_consider",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.park_operation.trim().is_empty() {
            return Err(ConfigurationError::InvalidValue {
                field: "park_operation",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            vehicle_priorities: vec!["IDLE_FIRST".to_string(), "BY_ENERGY_LEVEL".to_string()],
            order_priorities: vec!["BY_AGE".to_string()],
            vehicle_candidate_priorities: vec![
                "IDLE_FIRST".to_string(),
                "BY_COMPLETE_ROUTING_COSTS".to_string(),
            ],
            order_candidate_priorities: vec![
                "BY_DEADLINE".to_string(),
                "BY_COMPLETE_ROUTING_COSTS".to_string(),
            ],
            deadline_at_risk_period_ms: 60_000,
            recharge_idle_delay_ms: 0,
            max_routes_to_consider: 1,
            reroute_on_drive_order_finished: false,
            recharge_idle_vehicles: true,
            park_idle_vehicles: true,
            repark_idle_vehicles: false,
            park_operation: "PARK".to_string(),
            dispatch_interval_ms: 10_000,
            avoid_resources_allocated_by_others: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}
