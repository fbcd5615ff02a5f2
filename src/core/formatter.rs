use crate::types::response::TokenResponse;
use crate::types::token_cache::TokenCache;
use crate::types::token_id::TokenKey;

/// One entry per configured token, in declaration order. Missing tokens are
/// kept with `tokenData: null`.
pub fn format_response(tokens: &TokenCache) -> Vec<TokenResponse> {
    TokenKey::ALL
        .into_iter()
        .map(|key| TokenResponse {
            token_id: key.provider_id().to_string(),
            token_data: tokens.get(key).cloned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::token::fixtures::snapshot;
    use serde_json::json;

    #[test]
    fn missing_token_becomes_null() {
        let mut tokens = TokenCache::new();
        tokens.set(TokenKey::Ethereum, Some(snapshot("ethereum", 3000.0)));

        let body = serde_json::to_value(format_response(&tokens)).unwrap();

        assert_eq!(body[0]["tokenId"], json!("ethereum"));
        assert_eq!(body[0]["tokenData"]["current_price"], json!(3000.0));
        assert_eq!(body[1], json!({ "tokenId": "aver-ai", "tokenData": null }));
    }

    #[test]
    fn order_is_fixed() {
        let tokens: TokenCache = vec![
            (TokenKey::Aver, Some(snapshot("aver-ai", 0.2))),
            (TokenKey::Ethereum, Some(snapshot("ethereum", 3000.0))),
        ]
        .into_iter()
        .collect();

        let ids: Vec<_> = format_response(&tokens).into_iter().map(|r| r.token_id).collect();
        assert_eq!(ids, vec!["ethereum", "aver-ai"]);
    }
}
