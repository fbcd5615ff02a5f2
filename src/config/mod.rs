use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod loader;

pub use loader::AppConfig;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub ohlc_days: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: "https://pro-api.coingecko.com/api/v3".to_string(),
            api_key: None,
            timeout_ms: 10_000,
            max_retries: 3,
            base_delay_ms: 1_000,
            ohlc_days: crate::OHLC_WINDOW_DAYS,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Upstash REST endpoint, or `memory://` for a process-local cache.
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_ms: u64,
    pub price_ttl_secs: u64,
    pub lock_ttl_secs: u64,
}

impl CacheConfig {
    pub fn is_memory(&self) -> bool {
        self.url.as_deref().is_some_and(|url| url.starts_with("memory://"))
    }

    pub fn price_ttl(&self) -> Duration {
        Duration::from_secs(self.price_ttl_secs)
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            url: None,
            token: None,
            timeout_ms: 5_000,
            price_ttl_secs: crate::PRICE_TTL_SECS,
            lock_ttl_secs: crate::WRITE_LOCK_TTL_SECS,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `sqlite://<path>`, a bare path, or `:memory:`.
    pub url: Option<String>,
    pub pool_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            url: None,
            pool_size: 4,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct WriteBackConfig {
    pub interval_secs: u64,
}

impl WriteBackConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for WriteBackConfig {
    fn default() -> Self {
        WriteBackConfig {
            interval_secs: crate::DURABLE_WRITE_INTERVAL_SECS,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
