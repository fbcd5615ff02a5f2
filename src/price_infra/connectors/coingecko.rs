use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::interfaces::market_provider::MarketDataProvider;
use crate::price_infra::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::types::token::{OhlcPoint, TokenSnapshot};

pub const API_KEY_HEADER: &str = "x-cg-pro-api-key";

// Error bodies are echoed into logs, keep them short
const MAX_ERROR_BODY: usize = 256;

pub struct CoinGeckoClient {
    source_id: String,
    base_url: String,
    api_key: String,
    http: reqwest::Client,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl CoinGeckoClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::ConfigError("provider.api_key is required".to_string()))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("tokenfeed/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(CoinGeckoClient {
            source_id: "coingecko".to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            http,
            retry: RetryPolicy::new(config.max_retries, Duration::from_millis(config.base_delay_ms)),
            sleeper: Arc::new(TokioSleeper),
        })
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::ProviderTransport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = truncate_on_char_boundary(response.text().await.unwrap_or_default(), MAX_ERROR_BODY);
            return Err(Error::ProviderStatus {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::DeserializationError(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoClient {
    async fn market_data(&self, ids: &[String]) -> Result<Vec<TokenSnapshot>> {
        let query = [
            ("vs_currency", "usd".to_string()),
            ("ids", ids.join(",")),
            ("price_change_percentage", "1h,24h,7d".to_string()),
            ("sparkline", "true".to_string()),
            ("precision", "full".to_string()),
        ];

        let coins: Vec<CoinGeckoMarketToken> = self.retry
            .run(self.sleeper.as_ref(), "coingecko markets", || {
                self.get_json("/coins/markets", &query)
            })
            .await?;

        let snapshots: Vec<TokenSnapshot> = coins
            .into_iter()
            .map(TokenSnapshot::from)
            .filter(|snapshot| match snapshot.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Dropping {} market record: {}", self.source_id, e);
                    false
                }
            })
            .collect();

        tracing::debug!("Fetched {} of {} market records from {}", snapshots.len(), ids.len(), self.source_id);
        Ok(snapshots)
    }

    async fn ohlc(&self, id: &str, days: u32) -> Result<Vec<OhlcPoint>> {
        let path = format!("/coins/{}/ohlc", id);
        let query = [
            ("vs_currency", "usd".to_string()),
            ("days", days.to_string()),
            ("precision", "full".to_string()),
        ];

        let rows: Vec<Vec<f64>> = self.retry
            .run(self.sleeper.as_ref(), "coingecko ohlc", || {
                self.get_json(&path, &query)
            })
            .await?;

        let points = rows
            .iter()
            .map(|row| OhlcPoint::from_row(row))
            .collect::<Result<Vec<_>>>()?;

        Ok(OhlcPoint::normalize_series(points))
    }
}

/// Cut `text` to at most `max` bytes without splitting a UTF-8 character.
fn truncate_on_char_boundary(mut text: String, max: usize) -> String {
    if text.len() > max {
        let cut = (0..=max).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(0);
        text.truncate(cut);
    }
    text
}

#[derive(Deserialize)]
struct CoinGeckoMarketToken {
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    image: Option<String>,
    current_price: Option<f64>,
    price_change_percentage_1h_in_currency: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    price_change_percentage_7d_in_currency: Option<f64>,
    total_volume: Option<f64>,
    market_cap: Option<f64>,
    sparkline_in_7d: Option<Sparkline>,
}

#[derive(Deserialize)]
struct Sparkline {
    #[serde(default)]
    price: Vec<f64>,
}

impl From<CoinGeckoMarketToken> for TokenSnapshot {
    fn from(coin: CoinGeckoMarketToken) -> Self {
        TokenSnapshot {
            id: coin.id,
            name: coin.name,
            symbol: coin.symbol,
            image: coin.image.unwrap_or_default(),
            current_price: coin.current_price.unwrap_or(0.0),
            price_change_percentage_1h: coin.price_change_percentage_1h_in_currency.unwrap_or(0.0),
            price_change_percentage_24h: coin.price_change_percentage_24h.unwrap_or(0.0),
            price_change_percentage_7d: coin.price_change_percentage_7d_in_currency.unwrap_or(0.0),
            total_volume: coin.total_volume.unwrap_or(0.0),
            market_cap: coin.market_cap.unwrap_or(0.0),
            sparkline_data: coin.sparkline_in_7d.map(|s| s.price).unwrap_or_default(),
            ohlc_data: None,
        }
    }
}
