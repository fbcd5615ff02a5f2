use crate::error::{Error, Result};

/// Tier that produced the data returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Cache,
    Live,
    Durable,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Cache => "cache",
            DataSource::Live => "live",
            DataSource::Durable => "durable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    CheckCache,
    FetchLive,
    FetchDurable,
    Done(DataSource),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchEvent {
    CacheHit,
    CacheMiss,
    LiveOk,
    LiveFailed,
    DurableFound,
    DurablePartial,
    DurableMissing,
}

impl FetchState {
    pub fn transition(self, event: FetchEvent) -> Result<FetchState> {
        use FetchEvent::*;
        use FetchState::*;

        match (self, event) {
            (CheckCache, CacheHit) => Ok(Done(DataSource::Cache)),
            (CheckCache, CacheMiss) => Ok(FetchLive),
            (FetchLive, LiveOk) => Ok(Done(DataSource::Live)),
            (FetchLive, LiveFailed) => Ok(FetchDurable),
            (FetchDurable, DurableFound | DurablePartial) => Ok(Done(DataSource::Durable)),
            (FetchDurable, DurableMissing) => Ok(Failed),
            (state, event) => Err(Error::InvalidTransition { state, event }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchState::Done(_) | FetchState::Failed)
    }
}
