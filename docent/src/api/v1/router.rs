use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;
use super::middleware::v1_auth_middleware;

pub fn v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/chat", post(handlers::chat::chat))
        .route("/cache/stats", get(handlers::stats::cache_stats))
        .route("/sessions/stats", get(handlers::stats::session_stats))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    let protected_routes = Router::new()
        .route("/admin/cache:clear", post(handlers::admin::clear_cache))
        .route(
            "/admin/knowledge:reload",
            post(handlers::admin::reload_knowledge),
        )
        .route_layer(middleware::from_fn_with_state(state, v1_auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
