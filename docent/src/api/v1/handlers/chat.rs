//! v1 Chat handler.

use axum::extract::State;
use validator::Validate;

use crate::api::v1::dto::{ChatRequest, ChatResponse};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::{AppJson, AppState};

/// `POST /api/v1/chat`
///
/// Answers one visitor message. Omitting `sessionId`, or sending one that
/// is blank, unknown or expired, starts a new conversation; the reply carries
/// the session to use next.
#[utoipa::path(
    post,
    path = "/api/v1/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Empty or over-long message", body = ApiError),
    )
)]
pub async fn chat(
    State(state): State<AppState>,
    AppJson(req): AppJson<ChatRequest>,
) -> ApiResponse<ChatResponse> {
    if let Err(e) = req.validate() {
        return ApiResponse::error(ErrorCode::InvalidRequest, format!("Invalid request: {e}"));
    }
    if req.message.trim().is_empty() {
        return ApiResponse::error(ErrorCode::InvalidRequest, "Message cannot be empty");
    }

    let limit = state.config.server.max_message_chars;
    if req.message.chars().count() > limit {
        return ApiResponse::error(
            ErrorCode::InvalidRequest,
            format!("Message must be at most {limit} characters"),
        );
    }

    match state
        .chat
        .handle_message(req.session(), &req.message, req.use_cache)
        .await
    {
        Ok(reply) => ApiResponse::success(reply.into()),
        Err(e) => e.into(),
    }
}
