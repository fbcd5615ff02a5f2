use async_trait::async_trait;
use crate::error::Result;
use crate::types::token::{OhlcPoint, TokenSnapshot};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Price and metadata for a batch of ids. Ids the provider does not know
    /// are missing from the result; that is not an error.
    async fn market_data(&self, ids: &[String]) -> Result<Vec<TokenSnapshot>>;

    /// OHLC history for one id over the last `days` days, ascending.
    async fn ohlc(&self, id: &str, days: u32) -> Result<Vec<OhlcPoint>>;
}
