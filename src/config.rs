use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Redis,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "redis" => Ok(StoreBackend::Redis),
            other => Err(format!("expected memory or redis, got {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub port: u16,
    pub store_backend: StoreBackend,
    pub redis_url: String,
    pub store_timeout: Duration,
    pub cas_retries: u32,
    /// JSON catalog file. Built-in catalog when unset.
    pub catalog_path: Option<PathBuf>,
    pub base_click_power: u64,
    /// Periodic settle interval. `None` disables the ticker.
    pub tick_interval: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8001,
            store_backend: StoreBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            store_timeout: Duration::from_millis(500),
            cas_retries: 16,
            catalog_path: None,
            base_click_power: 1,
            tick_interval: None,
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| env::var(key).ok())
    }

    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store_timeout_ms: u64 = try_load(&lookup, "STORE_TIMEOUT_MS", "500")?;
        let tick_secs: u64 = try_load(&lookup, "TICK_INTERVAL_SECS", "0")?;
        let base_click_power: u64 = try_load(&lookup, "BASE_CLICK_POWER", "1")?;

        if store_timeout_ms == 0 {
            return Err(invalid("STORE_TIMEOUT_MS", "0", "must be positive"));
        }
        if base_click_power == 0 {
            return Err(invalid("BASE_CLICK_POWER", "0", "must be at least 1"));
        }

        Ok(Self {
            port: try_load(&lookup, "PORT", "8001")?,
            store_backend: try_load(&lookup, "STORE_BACKEND", "memory")?,
            redis_url: try_load(&lookup, "REDIS_URL", "redis://127.0.0.1:6379")?,
            store_timeout: Duration::from_millis(store_timeout_ms),
            cas_retries: try_load(&lookup, "CAS_RETRIES", "16")?,
            catalog_path: lookup("CATALOG_PATH").filter(|p| !p.trim().is_empty()).map(PathBuf::from),
            base_click_power,
            tick_interval: (tick_secs > 0).then(|| Duration::from_secs(tick_secs)),
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        invalid(key, &value, e)
    })
}

fn invalid(key: &'static str, value: &str, reason: impl Display) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
