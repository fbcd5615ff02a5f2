use futures::future::try_join_all;
use crate::error::Result;
use crate::interfaces::market_provider::MarketDataProvider;
use crate::types::token_cache::TokenCache;
use crate::types::token_id::TokenKey;

/// Combines the provider's batch market data with per-token OHLC history.
pub struct LiveAggregator {
    ohlc_days: u32,
}

impl LiveAggregator {
    pub fn new(ohlc_days: u32) -> Self {
        LiveAggregator { ohlc_days }
    }

    /// Fetch every configured token from the provider.
    ///
    /// The batch call and every history call run concurrently and are all
    /// awaited before combining. Any failure fails the whole fetch; a token the
    /// provider did not return is left empty.
    pub async fn fetch(&self, provider: &dyn MarketDataProvider) -> Result<TokenCache> {
        let ids = TokenKey::provider_ids();

        let market = provider.market_data(&ids);
        let histories = try_join_all(
            TokenKey::ALL
                .into_iter()
                .map(|key| provider.ohlc(key.provider_id(), self.ohlc_days)),
        );

        let (market, histories) = futures::try_join!(market, histories)?;

        // Step 1: Index history by token
        let mut histories: Vec<Option<_>> = histories.into_iter().map(Some).collect();

        // Step 2: Attach each token's history to its market record
        let mut tokens = TokenCache::new();
        for snapshot in market {
            let Some(key) = TokenKey::from_provider_id(&snapshot.id) else {
                tracing::debug!("Ignoring unrequested token {}", snapshot.id);
                continue;
            };
            let history = histories[key.index()].take().unwrap_or_default();
            tokens.set(key, Some(snapshot.with_ohlc(history)));
        }

        let missing = tokens.missing();
        if !missing.is_empty() {
            tracing::warn!("Provider returned no market data for {:?}", missing);
        }

        Ok(tokens)
    }
}
