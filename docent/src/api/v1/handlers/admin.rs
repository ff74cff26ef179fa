//! v1 Admin handlers.

use axum::extract::{Query, State};

use crate::api::v1::dto::{CacheClearResponse, KnowledgeReloadQuery, KnowledgeReloadResponse};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;

/// `POST /api/v1/admin/cache:clear`
#[utoipa::path(
    post,
    path = "/api/v1/admin/cache:clear",
    tag = "admin",
    responses(
        (status = 200, description = "Cache emptied", body = CacheClearResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn clear_cache(State(state): State<AppState>) -> ApiResponse<CacheClearResponse> {
    ApiResponse::success(CacheClearResponse {
        entries_removed: state.chat.clear_cache(),
    })
}

/// `POST /api/v1/admin/knowledge:reload`
///
/// Re-reads the knowledge document and swaps in a new index. A document
/// that fails to segment is rejected and the previous index keeps serving.
#[utoipa::path(
    post,
    path = "/api/v1/admin/knowledge:reload",
    tag = "admin",
    params(KnowledgeReloadQuery),
    responses(
        (status = 200, description = "Reload finished", body = KnowledgeReloadResponse),
        (status = 400, description = "Knowledge document rejected", body = ApiError),
        (status = 503, description = "Embedding service unavailable", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn reload_knowledge(
    State(state): State<AppState>,
    Query(query): Query<KnowledgeReloadQuery>,
) -> ApiResponse<KnowledgeReloadResponse> {
    match state.chat.reload_knowledge(query.force).await {
        Ok(Some(outcome)) => ApiResponse::success(KnowledgeReloadResponse {
            reloaded: true,
            chunk_count: outcome.chunk_count,
            digest: outcome.digest,
        }),
        Ok(None) => match state.chat.knowledge().snapshot() {
            Some(snapshot) => ApiResponse::success(KnowledgeReloadResponse {
                reloaded: false,
                chunk_count: snapshot.chunk_count,
                digest: snapshot.digest.clone(),
            }),
            None => ApiResponse::error(ErrorCode::InternalError, "Knowledge base is not loaded"),
        },
        Err(e) => e.into(),
    }
}
