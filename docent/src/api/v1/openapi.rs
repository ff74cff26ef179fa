use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Docent API",
        version = "1.0.0",
        description = "Visitor chat answered from a structured company knowledge base.",
    ),
    paths(
        handlers::health::health_check,
        handlers::chat::chat,
        handlers::stats::cache_stats,
        handlers::stats::session_stats,
        handlers::admin::clear_cache,
        handlers::admin::reload_knowledge,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        // Chat
        dto::chat::ChatRequest,
        dto::chat::ChatResponse,
        dto::chat::V1Confidence,
        // Stats
        dto::stats::CacheStatsResponse,
        dto::stats::SessionStatsResponse,
        // Admin
        dto::admin::CacheClearResponse,
        dto::admin::KnowledgeReloadResponse,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::KnowledgeStatus,
        handlers::health::EmbeddingsStatus,
        handlers::health::LlmStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "chat", description = "Visitor conversation"),
        (name = "stats", description = "Cache and session counters"),
        (name = "admin", description = "Administrative operations (auth required)"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
