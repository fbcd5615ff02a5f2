use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::interfaces::fast_cache::FastCache;

pub mod memory;
pub mod upstash;

pub use memory::InMemoryCache;
pub use upstash::UpstashCache;

/// Build the configured cache backend.
pub fn from_config(config: &CacheConfig) -> Result<Arc<dyn FastCache>> {
    if config.is_memory() {
        tracing::info!("Using process-local fast cache");
        return Ok(Arc::new(InMemoryCache::new()));
    }
    Ok(Arc::new(UpstashCache::new(config)?))
}

pub async fn get_json<T: DeserializeOwned>(cache: &dyn FastCache, key: &str) -> Result<Option<T>> {
    match cache.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| Error::DeserializationError(format!("{}: {}", key, e))),
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize + ?Sized>(
    cache: &dyn FastCache,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| Error::SerializationError(format!("{}: {}", key, e)))?;
    cache.set(key, &raw, ttl).await
}
