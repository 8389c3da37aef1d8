//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use roulette::{game::MAX_STARTING_BALANCE, table::TableConfig};
use std::net::SocketAddr;

const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus exporter address; the exporter is off when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Round clock and account settings
    pub table: TableConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `metrics_bind_override` - Optional metrics address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if an address variable is set but cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        metrics_bind_override: Option<SocketAddr>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(
            |key| std::env::var(key).ok(),
            bind_override,
            metrics_bind_override,
        )
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(
        lookup: F,
        bind_override: Option<SocketAddr>,
        metrics_bind_override: Option<SocketAddr>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_addr(&lookup, "SERVER_BIND")?.unwrap_or(default_bind()),
        };

        let metrics_bind = match metrics_bind_override {
            Some(addr) => Some(addr),
            None => parse_addr(&lookup, "METRICS_BIND")?,
        };

        let defaults = TableConfig::default();
        let table = TableConfig {
            name: lookup("ROULETTE_TABLE_NAME").unwrap_or(defaults.name),
            betting_window_secs: parse_or(
                &lookup,
                "ROULETTE_BETTING_SECS",
                defaults.betting_window_secs,
            ),
            lockout_secs: parse_or(&lookup, "ROULETTE_LOCKOUT_SECS", defaults.lockout_secs),
            spin_duration_ms: parse_or(&lookup, "ROULETTE_SPIN_MS", defaults.spin_duration_ms),
            starting_balance: parse_or(
                &lookup,
                "ROULETTE_STARTING_BALANCE",
                defaults.starting_balance,
            ),
            tick_interval_ms: parse_or(&lookup, "ROULETTE_TICK_MS", defaults.tick_interval_ms),
            event_buffer: parse_or(&lookup, "ROULETTE_EVENT_BUFFER", defaults.event_buffer),
        };

        Ok(ServerConfig {
            bind,
            metrics_bind,
            table,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let table = &self.table;

        if table.betting_window_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "ROULETTE_BETTING_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if table.lockout_secs >= table.betting_window_secs {
            return Err(ConfigError::Invalid {
                var: "ROULETTE_LOCKOUT_SECS".to_string(),
                reason: format!(
                    "Must be less than the betting window ({})",
                    table.betting_window_secs
                ),
            });
        }

        if table.spin_duration_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "ROULETTE_SPIN_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if table.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "ROULETTE_TICK_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if table.starting_balance == 0 {
            return Err(ConfigError::Invalid {
                var: "ROULETTE_STARTING_BALANCE".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if table.starting_balance > MAX_STARTING_BALANCE {
            return Err(ConfigError::Invalid {
                var: "ROULETTE_STARTING_BALANCE".to_string(),
                reason: format!("Must not exceed {MAX_STARTING_BALANCE}"),
            });
        }

        if table.event_buffer == 0 {
            return Err(ConfigError::Invalid {
                var: "ROULETTE_EVENT_BUFFER".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6969))
}

fn parse_addr<F>(lookup: &F, key: &str) -> Result<Option<SocketAddr>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{raw}' is not an IP:PORT address (e.g. {DEFAULT_BIND})"),
        }),
    }
}

/// Helper to parse a variable with default fallback
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
