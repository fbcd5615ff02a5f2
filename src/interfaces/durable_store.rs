use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::types::token::TokenSnapshot;

/// Latest known good snapshot of one token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenDocument {
    pub token: String,
    pub snapshot: TokenSnapshot,
    pub updated_at: DateTime<Utc>,
}

/// One document per token, keyed by provider id. `upsert` overwrites the
/// previous snapshot and refreshes `updated_at`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn find_by_key(&self, token_id: &str) -> Result<Option<TokenDocument>>;
    async fn upsert(&self, token_id: &str, snapshot: &TokenSnapshot) -> Result<()>;
}
