//! Admin DTOs for the v1 API.

use serde::{Deserialize, Serialize};

/// Response for `POST /api/v1/admin/cache:clear`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheClearResponse {
    /// Number of cache entries removed.
    pub entries_removed: usize,
}

/// Query parameters for `POST /api/v1/admin/knowledge:reload`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct KnowledgeReloadQuery {
    /// Rebuild even when the document digest is unchanged (default: true).
    #[serde(default = "default_force")]
    pub force: bool,
}

fn default_force() -> bool {
    true
}

/// Response for `POST /api/v1/admin/knowledge:reload`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeReloadResponse {
    /// Whether a new index was built and swapped in.
    pub reloaded: bool,
    pub chunk_count: usize,
    /// SHA-256 of the knowledge document now serving.
    pub digest: String,
}
