use axum::extract::State;

use crate::api::v1::dto::{CacheStatsResponse, SessionStatsResponse};
use crate::api::v1::response::ApiResponse;
use crate::api::AppState;

/// `GET /api/v1/cache/stats`
#[utoipa::path(
    get,
    path = "/api/v1/cache/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Response cache counters", body = CacheStatsResponse),
    )
)]
pub async fn cache_stats(State(state): State<AppState>) -> ApiResponse<CacheStatsResponse> {
    ApiResponse::success(state.chat.get_cache_stats().into())
}

/// `GET /api/v1/sessions/stats`
#[utoipa::path(
    get,
    path = "/api/v1/sessions/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Active session counters", body = SessionStatsResponse),
    )
)]
pub async fn session_stats(State(state): State<AppState>) -> ApiResponse<SessionStatsResponse> {
    ApiResponse::success(state.chat.get_session_stats().into())
}
