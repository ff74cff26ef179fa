//! Cache and session statistics DTOs.

use serde::{Deserialize, Serialize};

use crate::models::{CacheStats, SessionStats};

/// Response for `GET /api/v1/cache/stats`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsResponse {
    /// Entries currently held, expired or not.
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            total: stats.total,
            valid: stats.valid,
            expired: stats.expired,
        }
    }
}

/// Response for `GET /api/v1/sessions/stats`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatsResponse {
    pub active_sessions: usize,
    /// Mean number of turns held per active session.
    pub avg_history_length: f64,
}

impl From<SessionStats> for SessionStatsResponse {
    fn from(stats: SessionStats) -> Self {
        Self {
            active_sessions: stats.active_sessions,
            avg_history_length: stats.avg_history_length,
        }
    }
}
