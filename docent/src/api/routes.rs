use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::v1;
use super::AppState;

/// Room for the JSON envelope around the message.
const BODY_OVERHEAD_BYTES: usize = 4096;

/// Largest request body accepted: the longest allowed message at four UTF-8
/// bytes per character, plus the envelope.
pub fn body_limit(max_message_chars: usize) -> usize {
    max_message_chars
        .saturating_mul(4)
        .saturating_add(BODY_OVERHEAD_BYTES)
}

/// Full HTTP surface: the v1 API under `/api/v1`, open CORS for the site
/// widget, request tracing and a body cap.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let limit = body_limit(state.config.server.max_message_chars);

    Router::new()
        .nest("/api/v1", v1::router::v1_router(state.clone()))
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
