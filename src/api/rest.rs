use axum::{
    Router,
    routing::get,
    extract::{Json, State},
    http::{HeaderName, HeaderValue, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;
use crate::api::error::ApiError;
use crate::core::formatter::format_response;
use crate::core::orchestrator::TokenOrchestrator;
use crate::observability::metrics::{REQUEST_LATENCY, gather_text};
use crate::observability::tracing::trace_token_request;

pub const SOURCE_HEADER: &str = "x-token-source";
pub const PARTIAL_HEADER: &str = "x-token-partial";

pub struct ApiState {
    pub orchestrator: Arc<TokenOrchestrator>,
}

pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/tokens", get(get_tokens))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_text(),
    )
}

async fn get_tokens(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    let timer = REQUEST_LATENCY.start_timer();
    let span = trace_token_request(Uuid::new_v4());

    let outcome = state.orchestrator.fetch_tokens().instrument(span).await?;
    timer.observe_duration();

    let mut response = Json(format_response(&outcome.tokens)).into_response();
    let headers = response.headers_mut();
    headers.insert(HeaderName::from_static(SOURCE_HEADER), HeaderValue::from_static(outcome.source.as_str()));
    if outcome.partial {
        headers.insert(HeaderName::from_static(PARTIAL_HEADER), HeaderValue::from_static("true"));
    }

    Ok(response)
}
