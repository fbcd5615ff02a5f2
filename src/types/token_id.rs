use serde::{Deserialize, Serialize};
use crate::{AVER_CACHE_KEY, AVER_TOKEN_ID, ETHEREUM_CACHE_KEY, ETHEREUM_TOKEN_ID};

/// The tokens served by the dashboard, in declaration order.
///
/// Declaration order is the response order; it is not alphabetical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKey {
    Ethereum,
    Aver,
}

impl TokenKey {
    pub const ALL: [TokenKey; 2] = [TokenKey::Ethereum, TokenKey::Aver];

    /// Identifier used by the market-data provider and as the durable document key.
    pub const fn provider_id(self) -> &'static str {
        match self {
            TokenKey::Ethereum => ETHEREUM_TOKEN_ID,
            TokenKey::Aver => AVER_TOKEN_ID,
        }
    }

    /// Fast cache key holding the latest snapshot.
    pub const fn cache_key(self) -> &'static str {
        match self {
            TokenKey::Ethereum => ETHEREUM_CACHE_KEY,
            TokenKey::Aver => AVER_CACHE_KEY,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            TokenKey::Ethereum => 0,
            TokenKey::Aver => 1,
        }
    }

    pub fn from_provider_id(id: &str) -> Option<TokenKey> {
        TokenKey::ALL.into_iter().find(|key| key.provider_id() == id)
    }

    pub fn provider_ids() -> Vec<String> {
        TokenKey::ALL.iter().map(|key| key.provider_id().to_string()).collect()
    }
}

impl std::fmt::Display for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.provider_id())
    }
}
