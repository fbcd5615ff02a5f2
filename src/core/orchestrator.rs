use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn, Instrument};
use crate::cache::{get_json, set_json};
use crate::core::state_machine::{DataSource, FetchEvent, FetchState};
use crate::core::write_back::DurableWriter;
use crate::error::{Error, Result};
use crate::interfaces::durable_store::DurableStore;
use crate::interfaces::fast_cache::FastCache;
use crate::interfaces::market_provider::MarketDataProvider;
use crate::observability::metrics::{CACHE_HITS, CACHE_MISSES, DURABLE_FALLBACKS, PROVIDER_FAILURES};
use crate::observability::tracing::trace_write_back;
use crate::price_infra::aggregator::LiveAggregator;
use crate::types::token::TokenSnapshot;
use crate::types::token_cache::TokenCache;
use crate::types::token_id::TokenKey;
use crate::utils::task_supervisor::TaskSupervisor;

/// Result of one read request.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub source: DataSource,
    pub tokens: TokenCache,
    /// Durable fallback found only some tokens
    pub partial: bool,
}

/// Sequences the three tiers for every read: fast cache, then the live
/// provider, then the durable store. Side effects of a read (cache fill,
/// write-back, cache refresh) never change what the read returns.
pub struct TokenOrchestrator {
    cache: Arc<dyn FastCache>,
    store: Arc<dyn DurableStore>,
    provider: Arc<dyn MarketDataProvider>,
    aggregator: LiveAggregator,
    writer: DurableWriter,
    price_ttl: Duration,
    tasks: Arc<TaskSupervisor>,
}

impl TokenOrchestrator {
    pub fn new(
        cache: Arc<dyn FastCache>,
        store: Arc<dyn DurableStore>,
        provider: Arc<dyn MarketDataProvider>,
        aggregator: LiveAggregator,
        writer: DurableWriter,
        price_ttl: Duration,
        tasks: Arc<TaskSupervisor>,
    ) -> Self {
        TokenOrchestrator {
            cache,
            store,
            provider,
            aggregator,
            writer,
            price_ttl,
            tasks,
        }
    }

    pub fn tasks(&self) -> &Arc<TaskSupervisor> {
        &self.tasks
    }

    pub async fn fetch_tokens(&self) -> Result<FetchOutcome> {
        let mut state = FetchState::CheckCache;

        // Tier 1: fast cache
        let cached = self.read_cache().await;
        if cached.is_complete() {
            CACHE_HITS.inc();
            state = state.transition(FetchEvent::CacheHit)?;
            return self.finish(state, cached, false);
        }
        CACHE_MISSES.inc();
        state = state.transition(FetchEvent::CacheMiss)?;

        // Tier 2: live provider
        match self.aggregator.fetch(self.provider.as_ref()).await {
            Ok(tokens) => {
                self.fill_cache(&tokens).await;
                self.spawn_write_back(tokens.clone());
                state = state.transition(FetchEvent::LiveOk)?;
                return self.finish(state, tokens, false);
            }
            Err(e) => {
                PROVIDER_FAILURES.inc();
                warn!("Live fetch failed, falling back to durable store: {}", e);
                state = state.transition(FetchEvent::LiveFailed)?;
            }
        }

        // Tier 3: durable store
        let stored = self.read_store().await;
        let event = if stored.is_complete() {
            DURABLE_FALLBACKS.inc();
            self.spawn_cache_refresh(stored.clone());
            FetchEvent::DurableFound
        } else if !stored.is_empty() {
            DURABLE_FALLBACKS.inc();
            warn!("Durable store has no document for {:?}", stored.missing());
            FetchEvent::DurablePartial
        } else {
            FetchEvent::DurableMissing
        };

        state = state.transition(event)?;
        self.finish(state, stored, event == FetchEvent::DurablePartial)
    }

    fn finish(&self, state: FetchState, tokens: TokenCache, partial: bool) -> Result<FetchOutcome> {
        match state {
            FetchState::Done(source) => {
                debug!("Serving tokens from {}", source.as_str());
                Ok(FetchOutcome { source, tokens, partial })
            }
            _ => Err(Error::DataUnavailable),
        }
    }

    /// Every key is read concurrently; a failed read counts as a miss.
    async fn read_cache(&self) -> TokenCache {
        let reads = TokenKey::ALL.into_iter().map(|key| async move {
            let snapshot = match get_json::<TokenSnapshot>(self.cache.as_ref(), key.cache_key()).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("Cache read for {} failed: {}", key, e);
                    None
                }
            };
            (key, snapshot)
        });
        join_all(reads).await.into_iter().collect()
    }

    async fn fill_cache(&self, tokens: &TokenCache) {
        let writes = tokens.present().map(|(key, snapshot)| async move {
            if let Err(e) = set_json(self.cache.as_ref(), key.cache_key(), snapshot, Some(self.price_ttl)).await {
                warn!("Cache write for {} failed: {}", key, e);
            }
        });
        join_all(writes).await;
    }

    /// Every token is looked up concurrently; a failed lookup counts as absent.
    async fn read_store(&self) -> TokenCache {
        let reads = TokenKey::ALL.into_iter().map(|key| async move {
            let snapshot = match self.store.find_by_key(key.provider_id()).await {
                Ok(document) => document.map(|doc| doc.snapshot),
                Err(e) => {
                    warn!("Durable lookup for {} failed: {}", key, e);
                    None
                }
            };
            (key, snapshot)
        });
        join_all(reads).await.into_iter().collect()
    }

    fn spawn_write_back(&self, tokens: TokenCache) {
        let writer = self.writer.clone();
        self.tasks.spawn(
            "durable_write_back",
            async move {
                let outcome = writer.maybe_write(&tokens).await;
                debug!("Durable write-back outcome: {:?}", outcome);
            }
            .instrument(trace_write_back()),
        );
    }

    fn spawn_cache_refresh(&self, tokens: TokenCache) {
        let cache = Arc::clone(&self.cache);
        let ttl = self.price_ttl;
        self.tasks.spawn("cache_refresh", async move {
            let mut refreshed = 0;
            for (key, snapshot) in tokens.present() {
                match set_json(cache.as_ref(), key.cache_key(), snapshot, Some(ttl)).await {
                    Ok(()) => refreshed += 1,
                    Err(e) => warn!("Cache refresh for {} failed: {}", key, e),
                }
            }
            info!("Refreshed {} cache entries from durable store", refreshed);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::interfaces::durable_store::{MockDurableStore, TokenDocument};
    use crate::interfaces::fast_cache::MockFastCache;
    use crate::interfaces::market_provider::MockMarketDataProvider;
    use crate::types::token::fixtures::snapshot;

    fn cached_json(key: &str) -> Option<String> {
        let snapshot = match key {
            "ethereum:price" => snapshot("ethereum", 3000.0),
            "aver:price" => snapshot("aver-ai", 0.2),
            _ => return None,
        };
        Some(serde_json::to_string(&snapshot).unwrap())
    }

    fn document(id: &str, price: f64) -> TokenDocument {
        TokenDocument {
            token: id.to_string(),
            snapshot: snapshot(id, price),
            updated_at: Utc::now(),
        }
    }

    fn failing_provider() -> MockMarketDataProvider {
        let mut provider = MockMarketDataProvider::new();
        provider
            .expect_market_data()
            .returning(|_| Err(Error::ProviderStatus { status: 500, message: "down".to_string() }));
        provider.expect_ohlc().returning(|_, _| Ok(vec![]));
        provider
    }

    fn orchestrator(
        cache: MockFastCache,
        store: MockDurableStore,
        provider: MockMarketDataProvider,
    ) -> TokenOrchestrator {
        let cache: Arc<dyn FastCache> = Arc::new(cache);
        let store: Arc<dyn DurableStore> = Arc::new(store);
        let writer = DurableWriter::new(
            Arc::clone(&cache),
            Arc::clone(&store),
            Duration::from_secs(60),
            Duration::from_secs(1),
        );
        TokenOrchestrator::new(
            cache,
            store,
            Arc::new(provider),
            LiveAggregator::new(7),
            writer,
            Duration::from_secs(30),
            Arc::new(TaskSupervisor::new()),
        )
    }

    #[tokio::test]
    async fn full_cache_hit_touches_nothing_else() {
        let mut cache = MockFastCache::new();
        cache.expect_get().times(2).returning(|key| Ok(cached_json(key)));
        cache.expect_set().never();
        cache.expect_set_if_not_exists().never();
        let mut store = MockDurableStore::new();
        store.expect_find_by_key().never();
        store.expect_upsert().never();
        let mut provider = MockMarketDataProvider::new();
        provider.expect_market_data().never();
        provider.expect_ohlc().never();

        let orchestrator = orchestrator(cache, store, provider);
        let outcome = orchestrator.fetch_tokens().await.unwrap();

        assert_eq!(outcome.source, DataSource::Cache);
        assert!(outcome.tokens.is_complete());
        assert_eq!(orchestrator.tasks().active_task_count(), 0);
    }

    #[tokio::test]
    async fn partial_cache_goes_live_and_fills_cache() {
        let mut cache = MockFastCache::new();
        cache.expect_get().returning(|key| match key {
            "ethereum:price" => Ok(cached_json(key)),
            _ => Ok(None),
        });
        cache.expect_set().times(2).returning(|_, _, ttl| {
            assert_eq!(ttl, Some(Duration::from_secs(30)));
            Ok(())
        });
        // Write-back runs in the background; a held lock keeps it short
        cache.expect_set_if_not_exists().returning(|_, _, _| Ok(false));
        let mut store = MockDurableStore::new();
        store.expect_find_by_key().never();
        store.expect_upsert().never();
        let mut provider = MockMarketDataProvider::new();
        provider
            .expect_market_data()
            .times(1)
            .returning(|_| Ok(vec![snapshot("ethereum", 3100.0), snapshot("aver-ai", 0.25)]));
        provider.expect_ohlc().times(2).returning(|_, _| Ok(vec![]));

        let orchestrator = orchestrator(cache, store, provider);
        let outcome = orchestrator.fetch_tokens().await.unwrap();
        orchestrator.tasks().wait_idle().await.unwrap();

        assert_eq!(outcome.source, DataSource::Live);
        assert_eq!(outcome.tokens.get(TokenKey::Ethereum).unwrap().current_price, 3100.0);
    }

    #[tokio::test]
    async fn cache_errors_count_as_misses() {
        let mut cache = MockFastCache::new();
        cache
            .expect_get()
            .returning(|_| Err(Error::CacheError("connection refused".to_string())));
        cache.expect_set().returning(|_, _, _| Err(Error::CacheError("connection refused".to_string())));
        cache
            .expect_set_if_not_exists()
            .returning(|_, _, _| Err(Error::CacheError("connection refused".to_string())));
        let mut store = MockDurableStore::new();
        store.expect_upsert().never();
        let mut provider = MockMarketDataProvider::new();
        provider
            .expect_market_data()
            .returning(|_| Ok(vec![snapshot("ethereum", 3100.0), snapshot("aver-ai", 0.25)]));
        provider.expect_ohlc().returning(|_, _| Ok(vec![]));

        let orchestrator = orchestrator(cache, store, provider);
        let outcome = orchestrator.fetch_tokens().await.unwrap();
        orchestrator.tasks().wait_idle().await.unwrap();

        assert_eq!(outcome.source, DataSource::Live);
        assert!(outcome.tokens.is_complete());
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_store() {
        let mut cache = MockFastCache::new();
        cache.expect_get().returning(|_| Ok(None));
        cache.expect_set().times(2).returning(|_, _, _| Ok(()));
        cache.expect_set_if_not_exists().never();
        let mut store = MockDurableStore::new();
        store.expect_find_by_key().times(2).returning(|id| {
            let price = if id == "ethereum" { 2900.0 } else { 0.18 };
            Ok(Some(document(id, price)))
        });
        store.expect_upsert().never();

        let orchestrator = orchestrator(cache, store, failing_provider());
        let outcome = orchestrator.fetch_tokens().await.unwrap();
        orchestrator.tasks().wait_idle().await.unwrap();

        assert_eq!(outcome.source, DataSource::Durable);
        assert!(!outcome.partial);
        assert_eq!(outcome.tokens.get(TokenKey::Aver).unwrap().current_price, 0.18);
    }

    #[tokio::test]
    async fn one_stored_token_is_a_partial_result() {
        let mut cache = MockFastCache::new();
        cache.expect_get().returning(|_| Ok(None));
        cache.expect_set().never();
        let mut store = MockDurableStore::new();
        store.expect_find_by_key().returning(|id| match id {
            "aver-ai" => Ok(Some(document(id, 0.18))),
            _ => Err(Error::StoreError("timeout".to_string())),
        });

        let orchestrator = orchestrator(cache, store, failing_provider());
        let outcome = orchestrator.fetch_tokens().await.unwrap();

        assert_eq!(outcome.source, DataSource::Durable);
        assert!(outcome.partial);
        assert!(outcome.tokens.get(TokenKey::Ethereum).is_none());
        assert_eq!(orchestrator.tasks().active_task_count(), 0);
    }

    #[tokio::test]
    async fn nothing_anywhere_is_data_unavailable() {
        let mut cache = MockFastCache::new();
        cache.expect_get().returning(|_| Ok(None));
        let mut store = MockDurableStore::new();
        store.expect_find_by_key().returning(|_| Ok(None));

        let result = orchestrator(cache, store, failing_provider()).fetch_tokens().await;
        assert!(matches!(result, Err(Error::DataUnavailable)));
    }
}
