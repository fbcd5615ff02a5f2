pub mod fast_cache;
pub mod durable_store;
pub mod market_provider;
