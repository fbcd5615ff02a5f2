use thiserror::Error;
use crate::core::state_machine::{FetchEvent, FetchState};
use crate::price_infra::retry::RateLimitSignal;

#[derive(Error, Debug)]
pub enum Error {
    // Fast Cache Errors
    #[error("Cache error: {0}")]
    CacheError(String),

    // Durable Store Errors
    #[error("Store error: {0}")]
    StoreError(String),

    // Provider Errors
    #[error("Provider returned status {status}: {message}")]
    ProviderStatus {
        status: u16,
        message: String,
    },

    #[error("Provider transport error: {0}")]
    ProviderTransport(String),

    // Data Errors
    #[error("Deserialization failed: {0}")]
    DeserializationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid token data: {0}")]
    InvalidTokenData(String),

    // Orchestration Errors
    #[error("Invalid fetch transition: {event:?} in state {state:?}")]
    InvalidTransition {
        state: FetchState,
        event: FetchEvent,
    },

    #[error("Token data unavailable from every source")]
    DataUnavailable,

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    // System Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl RateLimitSignal for Error {
    fn status_code(&self) -> Option<u16> {
        match self {
            Error::ProviderStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::DeserializationError(e.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::StoreError(e.to_string())
    }
}

impl From<r2d2::Error> for Error {
    fn from(e: r2d2::Error) -> Self {
        Error::StoreError(e.to_string())
    }
}

impl From<::config::ConfigError> for Error {
    fn from(e: ::config::ConfigError) -> Self {
        Error::ConfigError(e.to_string())
    }
}
