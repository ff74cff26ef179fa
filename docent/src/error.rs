use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::v1::response::ApiResponse;

#[derive(Error, Debug)]
pub enum DocentError {
    #[error("Segmentation error: {0}")]
    Segmentation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("{service} failed after {attempts} attempt(s): {message}")]
    ExternalService {
        service: String,
        attempts: u32,
        message: String,
    },

    #[error("Cache corruption: fingerprint {fingerprint} holds a different query")]
    CacheCorruption { fingerprint: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("API rate limit exceeded, retry after {retry_after:?} seconds")]
    ApiRateLimit { retry_after: Option<u64> },

    #[error("API authentication error: {0}")]
    ApiAuth(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl DocentError {
    /// Whether a failed external call is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            DocentError::Timeout(_)
            | DocentError::ApiRateLimit { .. }
            | DocentError::Http(_)
            | DocentError::Embedding(_)
            | DocentError::Llm(_) => true,
            DocentError::Segmentation(_)
            | DocentError::InvalidArgument(_)
            | DocentError::UnknownSession(_)
            | DocentError::ExternalService { .. }
            | DocentError::CacheCorruption { .. }
            | DocentError::Validation(_)
            | DocentError::LlmUnavailable(_)
            | DocentError::ApiAuth(_)
            | DocentError::Json(_)
            | DocentError::Io(_)
            | DocentError::Internal(_) => false,
        }
    }
}

impl IntoResponse for DocentError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::from(self).into_response()
    }
}

pub type Result<T> = std::result::Result<T, DocentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_failures_are_retryable() {
        assert!(DocentError::Timeout(500).is_retryable());
        assert!(DocentError::ApiRateLimit { retry_after: None }.is_retryable());
        assert!(DocentError::Llm("503".into()).is_retryable());
    }

    #[test]
    fn caller_errors_are_not_retryable() {
        assert!(!DocentError::InvalidArgument("k must be > 0".into()).is_retryable());
        assert!(!DocentError::ApiAuth("bad key".into()).is_retryable());
        assert!(!DocentError::Validation("empty".into()).is_retryable());
    }

    #[test]
    fn external_service_message_names_attempts() {
        let err = DocentError::ExternalService {
            service: "embedding".into(),
            attempts: 3,
            message: "connection reset".into(),
        };
        assert_eq!(
            err.to_string(),
            "embedding failed after 3 attempt(s): connection reset"
        );
    }
}
