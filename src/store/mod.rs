pub mod sqlite;

pub use crate::interfaces::durable_store::{DurableStore, TokenDocument};
pub use sqlite::SqliteTokenStore;
