use lazy_static::lazy_static;
use prometheus::{
    Counter, Encoder, Histogram, HistogramOpts, Registry, TextEncoder,
};
use std::sync::Once;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Cache metrics
    pub static ref CACHE_HITS: Counter = Counter::new(
        "token_cache_hits_total",
        "Requests served entirely from the fast cache"
    ).unwrap();

    pub static ref CACHE_MISSES: Counter = Counter::new(
        "token_cache_misses_total",
        "Requests that needed a live fetch"
    ).unwrap();

    // Provider metrics
    pub static ref PROVIDER_FAILURES: Counter = Counter::new(
        "provider_failures_total",
        "Live fetches that failed after retries"
    ).unwrap();

    pub static ref PROVIDER_RETRIES: Counter = Counter::new(
        "provider_retries_total",
        "Rate-limited provider calls that were retried"
    ).unwrap();

    // Durable store metrics
    pub static ref DURABLE_FALLBACKS: Counter = Counter::new(
        "durable_fallbacks_total",
        "Requests served from the durable store"
    ).unwrap();

    pub static ref DURABLE_WRITES: Counter = Counter::new(
        "durable_writes_total",
        "Token documents written back to the durable store"
    ).unwrap();

    pub static ref DURABLE_WRITE_FAILURES: Counter = Counter::new(
        "durable_write_failures_total",
        "Failed durable upserts, lock or timestamp writes"
    ).unwrap();

    pub static ref LOCK_CONTENDED: Counter = Counter::new(
        "durable_write_lock_contended_total",
        "Write-back attempts that found the lock held"
    ).unwrap();

    // Latency metrics
    pub static ref REQUEST_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "token_request_latency_seconds",
            "Latency of GET /api/tokens"
        ).buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0])
    ).unwrap();
}

static REGISTER: Once = Once::new();

/// Safe to call more than once (tests build several routers).
pub fn register_metrics() {
    REGISTER.call_once(|| {
        REGISTRY.register(Box::new(CACHE_HITS.clone())).unwrap();
        REGISTRY.register(Box::new(CACHE_MISSES.clone())).unwrap();
        REGISTRY.register(Box::new(PROVIDER_FAILURES.clone())).unwrap();
        REGISTRY.register(Box::new(PROVIDER_RETRIES.clone())).unwrap();
        REGISTRY.register(Box::new(DURABLE_FALLBACKS.clone())).unwrap();
        REGISTRY.register(Box::new(DURABLE_WRITES.clone())).unwrap();
        REGISTRY.register(Box::new(DURABLE_WRITE_FAILURES.clone())).unwrap();
        REGISTRY.register(Box::new(LOCK_CONTENDED.clone())).unwrap();
        REGISTRY.register(Box::new(REQUEST_LATENCY.clone())).unwrap();
    });
}

/// Prometheus text exposition of every registered metric
pub fn gather_text() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
