use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::interfaces::fast_cache::FastCache;

#[derive(Debug, Deserialize)]
struct UpstashReply {
    #[serde(default)]
    result: Value,
    error: Option<String>,
}

/// Redis over the Upstash REST protocol: every command is a JSON array
/// POSTed to the database URL.
pub struct UpstashCache {
    url: String,
    token: String,
    http: reqwest::Client,
}

impl UpstashCache {
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let url = config
            .url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::ConfigError("cache.url is required".to_string()))?;
        let token = config
            .token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| Error::ConfigError("cache.token is required".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(UpstashCache {
            url: url.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    async fn command(&self, args: &[&str]) -> Result<Value> {
        let response = self.http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await
            .map_err(|e| Error::CacheError(format!("{}: {}", args[0], e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::CacheError(format!("{}: {}", args[0], e)))?;

        let reply: UpstashReply = match serde_json::from_str(&body) {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => {
                return Err(Error::CacheError(format!("{} returned status {}", args[0], status)));
            }
            Err(e) => return Err(Error::CacheError(format!("{}: malformed reply: {}", args[0], e))),
        };

        if let Some(error) = reply.error {
            return Err(Error::CacheError(format!("{}: {}", args[0], error)));
        }
        if !status.is_success() {
            return Err(Error::CacheError(format!("{} returned status {}", args[0], status)));
        }

        Ok(reply.result)
    }
}

#[async_trait]
impl FastCache for UpstashCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.command(&["GET", key]).await? {
            Value::Null => Ok(None),
            Value::String(value) => Ok(Some(value)),
            other => Err(Error::CacheError(format!("GET {}: unexpected result {}", key, other))),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        match ttl {
            Some(ttl) => {
                let secs = ttl.as_secs().max(1).to_string();
                self.command(&["SET", key, value, "EX", &secs]).await?;
            }
            None => {
                self.command(&["SET", key, value]).await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.command(&["DEL", key]).await?;
        Ok(())
    }

    async fn set_if_not_exists(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let secs = ttl.as_secs().max(1).to_string();
        let result = self.command(&["SET", key, value, "NX", "EX", &secs]).await?;
        Ok(result.as_str() == Some("OK"))
    }
}
