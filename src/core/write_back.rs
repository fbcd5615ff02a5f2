use futures::FutureExt;
use futures::future::join_all;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use crate::interfaces::durable_store::DurableStore;
use crate::interfaces::fast_cache::FastCache;
use crate::observability::metrics::{DURABLE_WRITES, DURABLE_WRITE_FAILURES, LOCK_CONTENDED};
use crate::types::token_cache::TokenCache;
use crate::utils::helper::{current_timestamp_ms, elapsed_since};
use crate::{DURABLE_WRITE_LOCK_KEY, LAST_DURABLE_WRITE_KEY, WRITE_LOCK_VALUE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No token data to persist; the timestamp is left alone
    NothingToWrite,
    /// Last write is younger than the interval; no lock attempted
    Throttled,
    /// Another instance holds the lock
    LockContended,
    /// The lock call itself failed
    LockUnavailable,
    Written { upserted: usize, failed: usize },
    /// The upsert phase panicked; the lock was still released
    Aborted,
}

/// Throttled, lock-guarded write-back of live data to the durable store.
///
/// Coordination state lives in the fast cache so every instance sharing the
/// cache sees the same timestamp and lock:
/// 1. read `lastDurableWrite`; younger than `interval` means skip
/// 2. `SET durableWriteLock NX` with a short TTL; losing the race means skip
/// 3. upsert every present token
/// 4. store the timestamp captured in step 1
/// 5. delete the lock (always, once)
///
/// An empty token set skips the whole sequence, so it never advances the
/// timestamp. Nothing here returns an error; every failure is logged and
/// counted.
#[derive(Clone)]
pub struct DurableWriter {
    cache: Arc<dyn FastCache>,
    store: Arc<dyn DurableStore>,
    interval: Duration,
    lock_ttl: Duration,
}

impl DurableWriter {
    pub fn new(
        cache: Arc<dyn FastCache>,
        store: Arc<dyn DurableStore>,
        interval: Duration,
        lock_ttl: Duration,
    ) -> Self {
        DurableWriter {
            cache,
            store,
            interval,
            lock_ttl,
        }
    }

    pub async fn maybe_write(&self, tokens: &TokenCache) -> WriteOutcome {
        if tokens.is_empty() {
            debug!("Durable write skipped, no token data");
            return WriteOutcome::NothingToWrite;
        }

        let now_ms = current_timestamp_ms();

        // Step 1: Throttle gate
        let last_ms = self.last_write_ms().await;
        let elapsed = elapsed_since(now_ms, last_ms);
        if elapsed < self.interval {
            debug!("Durable write skipped, last write {:?} ago", elapsed);
            return WriteOutcome::Throttled;
        }

        // Step 2: Acquire lock
        match self
            .cache
            .set_if_not_exists(DURABLE_WRITE_LOCK_KEY, WRITE_LOCK_VALUE, self.lock_ttl)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                LOCK_CONTENDED.inc();
                debug!("Durable write lock held elsewhere");
                return WriteOutcome::LockContended;
            }
            Err(e) => {
                DURABLE_WRITE_FAILURES.inc();
                warn!("Could not acquire durable write lock: {}", e);
                return WriteOutcome::LockUnavailable;
            }
        }

        // Steps 3-4 run under the lock; a panic must not skip the release
        let outcome = match AssertUnwindSafe(self.write_locked(tokens, now_ms)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(_) => {
                DURABLE_WRITE_FAILURES.inc();
                error!("Durable write panicked, releasing lock");
                WriteOutcome::Aborted
            }
        };

        // Step 5: Release lock
        if let Err(e) = self.cache.delete(DURABLE_WRITE_LOCK_KEY).await {
            DURABLE_WRITE_FAILURES.inc();
            warn!("Failed to release durable write lock (expires on its own): {}", e);
        }

        outcome
    }

    async fn last_write_ms(&self) -> Option<u64> {
        match self.cache.get(LAST_DURABLE_WRITE_KEY).await {
            Ok(Some(raw)) => match raw.trim().parse::<u64>() {
                Ok(ms) => Some(ms),
                Err(_) => {
                    warn!("Ignoring unparsable {} value {:?}", LAST_DURABLE_WRITE_KEY, raw);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Could not read {}: {}", LAST_DURABLE_WRITE_KEY, e);
                None
            }
        }
    }

    async fn write_locked(&self, tokens: &TokenCache, now_ms: u64) -> WriteOutcome {
        let results = join_all(tokens.present().map(|(key, snapshot)| async move {
            let result = self.store.upsert(key.provider_id(), snapshot).await;
            (key, result)
        }))
        .await;

        let mut upserted = 0;
        let mut failed = 0;
        for (key, result) in results {
            match result {
                Ok(()) => {
                    DURABLE_WRITES.inc();
                    upserted += 1;
                }
                Err(e) => {
                    DURABLE_WRITE_FAILURES.inc();
                    warn!("Durable upsert for {} failed: {}", key, e);
                    failed += 1;
                }
            }
        }

        if let Err(e) = self
            .cache
            .set(LAST_DURABLE_WRITE_KEY, &now_ms.to_string(), None)
            .await
        {
            DURABLE_WRITE_FAILURES.inc();
            warn!("Failed to record {}: {}", LAST_DURABLE_WRITE_KEY, e);
        }

        info!("Durable write-back finished: {} upserted, {} failed", upserted, failed);
        WriteOutcome::Written { upserted, failed }
    }
}
