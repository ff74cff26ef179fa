use serde::{Deserialize, Serialize};

use super::ConfidenceTier;

/// Outcome of one visitor message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response_text: String,
    pub session_id: String,
    pub confidence_tier: ConfidenceTier,
    pub cache_hit: bool,
    pub sources_used: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionStats {
    pub active_sessions: usize,
    pub avg_history_length: f64,
}
