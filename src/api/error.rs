use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crate::error::Error;
use crate::types::response::ErrorBody;

pub const UNAVAILABLE_MESSAGE: &str = "Unable to retrieve token data from any source";

/// Error surface of the HTTP API. Internal detail is logged, never returned.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("Token request failed: {}", self.0);

        let body = ErrorBody {
            message: UNAVAILABLE_MESSAGE.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
