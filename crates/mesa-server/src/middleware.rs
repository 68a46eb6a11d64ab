//! Request authentication middleware.
//!
//! Extracts the bearer credential, validates it against the session
//! authority, and exposes the resulting [`Principal`] (plus the raw
//! credential, needed for current-device marking) through request
//! extensions — explicit context instead of ambient per-request state.

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use mesa_auth::guard;

use crate::error::ApiError;
use crate::state::AppState;

/// The raw credential the caller presented, as extracted from the
/// bearer header.
#[derive(Clone)]
pub struct CurrentCredential(pub String);

pub async fn authenticate(
    State(state): State<AppState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let credential = guard::extract_bearer(header)?.to_string();
    let principal = state.authority.validate(&credential).await?;

    req.extensions_mut().insert(principal);
    req.extensions_mut().insert(CurrentCredential(credential));

    Ok(next.run(req).await)
}
