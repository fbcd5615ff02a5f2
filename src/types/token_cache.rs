use crate::types::token::TokenSnapshot;
use crate::types::token_id::TokenKey;

/// Per-request view of every configured token. A slot is `None` when the
/// token has no data yet or its lookup failed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenCache {
    slots: [Option<TokenSnapshot>; 2],
}

impl TokenCache {
    pub fn new() -> Self {
        TokenCache::default()
    }

    pub fn get(&self, key: TokenKey) -> Option<&TokenSnapshot> {
        self.slots[key.index()].as_ref()
    }

    pub fn set(&mut self, key: TokenKey, snapshot: Option<TokenSnapshot>) {
        self.slots[key.index()] = snapshot;
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Present tokens in declaration order.
    pub fn present(&self) -> impl Iterator<Item = (TokenKey, &TokenSnapshot)> {
        TokenKey::ALL
            .into_iter()
            .filter_map(|key| self.get(key).map(|snapshot| (key, snapshot)))
    }

    pub fn missing(&self) -> Vec<TokenKey> {
        TokenKey::ALL
            .into_iter()
            .filter(|key| self.get(*key).is_none())
            .collect()
    }
}

impl FromIterator<(TokenKey, Option<TokenSnapshot>)> for TokenCache {
    fn from_iter<I: IntoIterator<Item = (TokenKey, Option<TokenSnapshot>)>>(iter: I) -> Self {
        let mut cache = TokenCache::new();
        for (key, snapshot) in iter {
            cache.set(key, snapshot);
        }
        cache
    }
}
