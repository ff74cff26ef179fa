//! Chat request/response DTOs for the v1 API.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{ChatReply, ConfidenceTier};

/// Request body for `POST /api/v1/chat`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The visitor's message. The deployment's `DOCENT_MAX_MESSAGE_CHARS`
    /// limit is applied on top of this hard ceiling.
    #[validate(length(min = 1, max = 65536))]
    pub message: String,
    /// Session to continue. Omit it, or send one that is blank or unknown,
    /// to start a new conversation.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Whether a cached answer may be returned (default: true).
    #[serde(default = "default_true")]
    pub use_cache: bool,
}

impl ChatRequest {
    /// The session to continue; a blank id counts as none.
    pub fn session(&self) -> Option<&str> {
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

fn default_true() -> bool {
    true
}

/// How closely the retrieved knowledge matched the message.
///
/// Wire format: `"high"`, `"medium"`, or `"low"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum V1Confidence {
    High,
    Medium,
    Low,
}

impl From<ConfidenceTier> for V1Confidence {
    fn from(tier: ConfidenceTier) -> Self {
        match tier {
            ConfidenceTier::High => Self::High,
            ConfidenceTier::Medium => Self::Medium,
            ConfidenceTier::Low => Self::Low,
        }
    }
}

/// Response payload for `POST /api/v1/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub confidence: V1Confidence,
    pub cache_hit: bool,
    pub sources_used: usize,
}

impl From<ChatReply> for ChatResponse {
    fn from(reply: ChatReply) -> Self {
        Self {
            response: reply.response_text,
            session_id: reply.session_id,
            confidence: reply.confidence_tier.into(),
            cache_hit: reply.cache_hit,
            sources_used: reply.sources_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_defaults_use_cache_to_true() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"What is RPO?"}"#).unwrap();
        assert!(req.use_cache);
        assert!(req.session_id.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn request_reads_camel_case_fields() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"message":"hi","sessionId":"abc","useCache":false}"#,
        )
        .unwrap();
        assert_eq!(req.session_id.as_deref(), Some("abc"));
        assert!(!req.use_cache);
    }

    #[test]
    fn blank_or_long_session_ids_are_not_rejected() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"message":"hi","sessionId":"  "}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.session(), None);

        let long = "x".repeat(200);
        let req: ChatRequest =
            serde_json::from_value(serde_json::json!({"message": "hi", "sessionId": long})).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.session(), Some(long.as_str()));
    }

    #[test]
    fn empty_message_fails_validation() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":""}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn response_serializes_camel_case() {
        let resp = ChatResponse::from(ChatReply {
            response_text: "RPO fees are 15% lower.".into(),
            session_id: "s1".into(),
            confidence_tier: ConfidenceTier::High,
            cache_hit: true,
            sources_used: 2,
        });
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "response": "RPO fees are 15% lower.",
                "sessionId": "s1",
                "confidence": "high",
                "cacheHit": true,
                "sourcesUsed": 2,
            })
        );
    }
}
