pub mod api;
pub mod cache;
pub mod config;
pub mod core;
pub mod error;
pub mod interfaces;
pub mod observability;
pub mod price_infra;
pub mod store;
pub mod types;
pub mod utils;

// Provider ids, also the durable document keys
pub const ETHEREUM_TOKEN_ID: &str = "ethereum";
pub const AVER_TOKEN_ID: &str = "aver-ai";

// Fast cache keys
pub const ETHEREUM_CACHE_KEY: &str = "ethereum:price";
pub const AVER_CACHE_KEY: &str = "aver:price";
pub const LAST_DURABLE_WRITE_KEY: &str = "lastDurableWrite";
pub const DURABLE_WRITE_LOCK_KEY: &str = "durableWriteLock";
pub const WRITE_LOCK_VALUE: &str = "locked";

// Timing
pub const PRICE_TTL_SECS: u64 = 30;
pub const WRITE_LOCK_TTL_SECS: u64 = 1;
pub const DURABLE_WRITE_INTERVAL_SECS: u64 = 60;
pub const OHLC_WINDOW_DAYS: u32 = 7;
