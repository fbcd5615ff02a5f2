use crate::config::*;
use crate::error::{Error, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;

/// Conventional variable names accepted on top of the `TOKENFEED_*` scheme.
const ENV_OVERRIDES: [(&str, &str); 4] = [
    ("provider.api_key", "COINGECKO_API_KEY"),
    ("cache.url", "UPSTASH_REDIS_URL"),
    ("cache.token", "UPSTASH_REDIS_TOKEN"),
    ("store.url", "DATABASE_URL"),
];

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub cache: CacheConfig,
    pub store: StoreConfig,
    pub write_back: WriteBackConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("TOKENFEED")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        for (key, var) in ENV_OVERRIDES {
            let value = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(key, value)?;
        }

        Self::from_builder(builder)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Secrets have no defaults; a missing one stops start-up.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();

        if is_blank(&self.provider.api_key) {
            missing.push("provider.api_key");
        }
        if is_blank(&self.store.url) {
            missing.push("store.url");
        }
        if is_blank(&self.cache.url) {
            missing.push("cache.url");
        } else if !self.cache.is_memory() && is_blank(&self.cache.token) {
            missing.push("cache.token");
        }

        if !missing.is_empty() {
            return Err(Error::ConfigError(format!("missing required settings: {}", missing.join(", "))));
        }

        if self.write_back.interval_secs == 0 || self.cache.lock_ttl_secs == 0 {
            return Err(Error::ConfigError(
                "write_back.interval_secs and cache.lock_ttl_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE: &str = r#"
        [provider]
        api_key = "cg-key"

        [cache]
        url = "https://cache.example.upstash.io"
        token = "cache-token"

        [store]
        url = "sqlite://tokens.db"
    "#;

    #[test]
    fn complete_config_uses_defaults_for_the_rest() {
        let config = AppConfig::from_toml_str(COMPLETE).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.provider.max_retries, 3);
        assert_eq!(config.provider.base_delay_ms, 1_000);
        assert_eq!(config.provider.ohlc_days, 7);
        assert_eq!(config.cache.price_ttl_secs, 30);
        assert_eq!(config.cache.lock_ttl_secs, 1);
        assert_eq!(config.write_back.interval_secs, 60);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn missing_secrets_are_reported_together() {
        let err = AppConfig::from_toml_str("[server]\nport = 8080\n").unwrap_err();
        match err {
            Error::ConfigError(msg) => {
                assert!(msg.contains("provider.api_key"));
                assert!(msg.contains("store.url"));
                assert!(msg.contains("cache.url"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn remote_cache_requires_token() {
        let toml = COMPLETE.replace("token = \"cache-token\"", "");
        let err = AppConfig::from_toml_str(&toml).unwrap_err();
        assert!(matches!(err, Error::ConfigError(msg) if msg.contains("cache.token")));
    }

    #[test]
    fn memory_cache_needs_no_token() {
        let toml = r#"
            [provider]
            api_key = "cg-key"
            [cache]
            url = "memory://"
            [store]
            url = ":memory:"
            [logging]
            format = "json"
        "#;
        let config = AppConfig::from_toml_str(toml).unwrap();
        assert!(config.cache.is_memory());
        assert_eq!(config.logging.format, LogFormat::Json);
    }
}
