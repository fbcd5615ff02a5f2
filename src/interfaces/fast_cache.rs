use async_trait::async_trait;
use std::time::Duration;
use crate::error::Result;

/// Shared key/value cache with per-key expiry.
///
/// Implementations surface transport failures as `Error::CacheError`; callers
/// decide whether a failure is fatal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FastCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// `ttl = None` stores the value without expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Returns `true` when this call created the key.
    async fn set_if_not_exists(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;
}
