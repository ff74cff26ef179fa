//! Admin authentication for the v1 API.
//!
//! Only the `/admin/*` routes sit behind this layer: cache clearing and
//! knowledge reloads change what every visitor is served. Visitor routes
//! (`/chat`, `/health`, the stats endpoints, the docs) stay public.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::state::AppState;

use super::response::{ApiResponse, ErrorCode};

/// Why an admin request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// `DOCENT_API_KEYS` is empty, so admin routes are locked.
    NoKeysConfigured,
    MissingHeader,
    NotBearer,
    UnknownKey,
}

impl AdminAuthRejection {
    pub fn message(self) -> &'static str {
        match self {
            AdminAuthRejection::NoKeysConfigured => {
                "API keys not configured. Set DOCENT_API_KEYS to enable admin access."
            }
            AdminAuthRejection::MissingHeader => "Missing authorization header",
            AdminAuthRejection::NotBearer => {
                "Invalid authorization header format. Expected: Bearer <token>"
            }
            AdminAuthRejection::UnknownKey => "Invalid API key",
        }
    }
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        ApiResponse::<()>::error(ErrorCode::Unauthorized, self.message()).into_response()
    }
}

/// Checks the `Authorization: Bearer <key>` header against `api_keys`.
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use docent::api::v1::middleware::{authorize_admin, AdminAuthRejection};
///
/// let keys = vec!["ops-key".to_string()];
/// let mut headers = HeaderMap::new();
/// assert_eq!(authorize_admin(&headers, &keys), Err(AdminAuthRejection::MissingHeader));
///
/// headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer ops-key"));
/// assert_eq!(authorize_admin(&headers, &keys), Ok(()));
/// assert_eq!(authorize_admin(&headers, &[]), Err(AdminAuthRejection::NoKeysConfigured));
/// ```
pub fn authorize_admin(headers: &HeaderMap, api_keys: &[String]) -> Result<(), AdminAuthRejection> {
    if api_keys.is_empty() {
        return Err(AdminAuthRejection::NoKeysConfigured);
    }

    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AdminAuthRejection::MissingHeader)?;
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AdminAuthRejection::NotBearer)?;

    if api_keys.iter().any(|key| key == token) {
        Ok(())
    } else {
        Err(AdminAuthRejection::UnknownKey)
    }
}

/// `route_layer` guard for the admin routes; rejections use the v1 envelope
/// with status 401.
pub async fn v1_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match authorize_admin(request.headers(), &state.config.server.api_keys) {
        Ok(()) => next.run(request).await,
        Err(rejection) => {
            tracing::warn!(
                path = %request.uri().path(),
                reason = ?rejection,
                "Rejected admin request"
            );
            rejection.into_response()
        }
    }
}
