#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokenfeed::cache::InMemoryCache;
use tokenfeed::core::TokenOrchestrator;
use tokenfeed::core::write_back::DurableWriter;
use tokenfeed::error::{Error, Result};
use tokenfeed::interfaces::durable_store::DurableStore;
use tokenfeed::interfaces::fast_cache::FastCache;
use tokenfeed::interfaces::market_provider::MarketDataProvider;
use tokenfeed::price_infra::aggregator::LiveAggregator;
use tokenfeed::store::SqliteTokenStore;
use tokenfeed::types::token::{OhlcPoint, TokenSnapshot};
use tokenfeed::utils::task_supervisor::TaskSupervisor;

pub fn snapshot(id: &str, price: f64) -> TokenSnapshot {
    TokenSnapshot {
        id: id.to_string(),
        name: id.to_uppercase(),
        symbol: id.chars().take(3).collect(),
        image: format!("https://assets.example/{id}.png"),
        current_price: price,
        price_change_percentage_1h: 0.5,
        price_change_percentage_24h: 1.5,
        price_change_percentage_7d: -2.0,
        total_volume: 2_000_000.0,
        market_cap: 90_000_000.0,
        sparkline_data: vec![price],
        ohlc_data: None,
    }
}

/// Provider that serves a fixed market batch, or fails every call with a status.
pub struct FakeProvider {
    market: Vec<TokenSnapshot>,
    fail_status: Option<u16>,
    pub market_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn serving(market: Vec<TokenSnapshot>) -> Self {
        FakeProvider {
            market,
            fail_status: None,
            market_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(status: u16) -> Self {
        FakeProvider {
            market: Vec::new(),
            fail_status: Some(status),
            market_calls: AtomicUsize::new(0),
        }
    }

    pub fn market_calls(&self) -> usize {
        self.market_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        match self.fail_status {
            Some(status) => Err(Error::ProviderStatus {
                status,
                message: "provider unavailable".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MarketDataProvider for FakeProvider {
    async fn market_data(&self, ids: &[String]) -> Result<Vec<TokenSnapshot>> {
        self.market_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .market
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect())
    }

    async fn ohlc(&self, _id: &str, _days: u32) -> Result<Vec<OhlcPoint>> {
        self.check()?;
        Ok(vec![OhlcPoint {
            timestamp: 1_700_000_000_000,
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: None,
        }])
    }
}

pub struct Harness {
    pub cache: Arc<InMemoryCache>,
    pub store: Arc<SqliteTokenStore>,
    pub provider: Arc<FakeProvider>,
    pub orchestrator: Arc<TokenOrchestrator>,
}

impl Harness {
    pub fn new(provider: FakeProvider) -> Self {
        let cache = Arc::new(InMemoryCache::new());
        let store = Arc::new(SqliteTokenStore::open(":memory:", 1).unwrap());
        let provider = Arc::new(provider);

        let cache_dyn: Arc<dyn FastCache> = cache.clone();
        let store_dyn: Arc<dyn DurableStore> = store.clone();
        let writer = DurableWriter::new(
            Arc::clone(&cache_dyn),
            Arc::clone(&store_dyn),
            Duration::from_secs(60),
            Duration::from_secs(1),
        );
        let orchestrator = TokenOrchestrator::new(
            cache_dyn,
            store_dyn,
            provider.clone(),
            LiveAggregator::new(7),
            writer,
            Duration::from_secs(30),
            Arc::new(TaskSupervisor::new()),
        );

        Harness {
            cache,
            store,
            provider,
            orchestrator: Arc::new(orchestrator),
        }
    }

    pub async fn cached(&self, key: &str) -> Option<TokenSnapshot> {
        tokenfeed::cache::get_json(self.cache.as_ref(), key).await.unwrap()
    }

    pub async fn settle(&self) {
        self.orchestrator.tasks().wait_idle().await.unwrap();
    }
}
