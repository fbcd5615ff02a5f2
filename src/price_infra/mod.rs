pub mod connectors;
pub mod aggregator;
pub mod retry;
