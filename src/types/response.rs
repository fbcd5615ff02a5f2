use serde::{Deserialize, Serialize};
use crate::types::token::TokenSnapshot;

/// One entry of the `GET /api/tokens` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token_id: String,
    pub token_data: Option<TokenSnapshot>,
}

/// Body returned when no tier could produce data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
