//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mesa_auth::AuthError;
use serde_json::json;
use tracing::{error, warn};

/// Response-side wrapper around [`AuthError`].
pub struct ApiError(pub AuthError);

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError(err)
    }
}

/// Flatten login failures so an unauthenticated caller cannot tell an
/// unknown identity, a bad password, a disabled account, and a
/// suspended tenant apart. The real cause is logged internally.
pub fn flatten_login_error(err: AuthError) -> ApiError {
    match err {
        AuthError::InvalidCredentials | AuthError::AccountInactive | AuthError::TenantInactive => {
            warn!(cause = err.kind(), "login rejected");
            ApiError(AuthError::InvalidCredentials)
        }
        other => ApiError(other),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AuthError::InvalidCredentials
            | AuthError::Malformed(_)
            | AuthError::BadSignature
            | AuthError::Expired
            | AuthError::SessionRevoked
            | AuthError::InvalidRefresh
            | AuthError::ReuseDetected => StatusCode::UNAUTHORIZED,
            AuthError::AccountInactive | AuthError::TenantInactive | AuthError::Forbidden(_) => {
                StatusCode::FORBIDDEN
            }
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::Conflict => StatusCode::CONFLICT,
            AuthError::Crypto(_) | AuthError::Store(_) => {
                error!(error = %self.0, "internal failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Callers distinguish outcomes by `error` kind, not by prose.
        let body = Json(json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}
