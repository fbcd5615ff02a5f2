use async_trait::async_trait;
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};
use crate::error::{Error, Result};
use crate::interfaces::durable_store::{DurableStore, TokenDocument};
use crate::types::token::TokenSnapshot;

pub type DbPool = Pool<SqliteConnectionManager>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS token_documents (
    token      TEXT PRIMARY KEY,
    document   TEXT NOT NULL,
    updated_at TEXT NOT NULL
);";

/// Latest snapshot per token, one row each. Documents are stored as JSON.
#[derive(Clone)]
pub struct SqliteTokenStore {
    pool: DbPool,
}

impl SqliteTokenStore {
    /// Open (and create if needed) the store.
    ///
    /// Accepts `sqlite://<path>`, a bare path, or `:memory:`. An in-memory
    /// database lives inside a single connection, so its pool is pinned to
    /// one connection that is never recycled.
    pub fn open(url: &str, pool_size: u32) -> Result<Self> {
        let target = url.strip_prefix("sqlite://").unwrap_or(url);

        let pool = if target == ":memory:" {
            Pool::builder()
                .max_size(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .build(SqliteConnectionManager::memory())?
        } else {
            let manager = SqliteConnectionManager::file(target)
                .with_init(|conn| conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;"));
            Pool::builder().max_size(pool_size.max(1)).build(manager)?
        };

        pool.get()?.execute_batch(SCHEMA)?;
        tracing::info!("Opened durable token store at {}", target);

        Ok(SqliteTokenStore { pool })
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            op(&*conn)
        })
        .await
        .map_err(|e| Error::StoreError(format!("blocking task: {}", e)))?
    }
}

#[async_trait]
impl DurableStore for SqliteTokenStore {
    async fn find_by_key(&self, token_id: &str) -> Result<Option<TokenDocument>> {
        let token = token_id.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT document, updated_at FROM token_documents WHERE token = ?1",
                    params![token],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()?;

            let Some((document, updated_at)) = row else {
                return Ok(None);
            };

            let snapshot: TokenSnapshot = serde_json::from_str(&document)?;
            let updated_at = DateTime::parse_from_rfc3339(&updated_at)
                .map_err(|e| Error::StoreError(format!("updated_at for {}: {}", token, e)))?
                .with_timezone(&Utc);

            Ok(Some(TokenDocument { token, snapshot, updated_at }))
        })
        .await
    }

    async fn upsert(&self, token_id: &str, snapshot: &TokenSnapshot) -> Result<()> {
        let token = token_id.to_string();
        let document = serde_json::to_string(snapshot)
            .map_err(|e| Error::SerializationError(format!("{}: {}", token_id, e)))?;
        let updated_at = Utc::now().to_rfc3339();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO token_documents (token, document, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(token) DO UPDATE SET document = excluded.document, updated_at = excluded.updated_at",
                params![token, document, updated_at],
            )?;
            Ok(())
        })
        .await
    }
}
