//! HTTP handlers for the session authority.
//!
//! Transport framing only: the access credential travels as a bearer
//! header, the refresh secret as an opaque string in the request body.
//! All authorization decisions live in `mesa-auth`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router, middleware as axum_middleware};
use mesa_auth::service::LoginInput;
use mesa_core::models::principal::Principal;
use mesa_core::models::session::{DeviceType, SessionView};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, flatten_login_error};
use crate::middleware::{CurrentCredential, authenticate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct DeviceInfo {
    device_id: Option<String>,
    device_name: Option<String>,
    device_type: DeviceType,
    user_agent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
    device: DeviceInfo,
    #[serde(default = "default_scopes")]
    scopes: Vec<String>,
}

fn default_scopes() -> Vec<String> {
    vec!["read".into(), "write".into()]
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    refresh_secret: String,
}

#[derive(Debug, Serialize)]
struct TokenPairResponse {
    access_credential: String,
    refresh_secret: String,
    session_id: Uuid,
    expires_in: u64,
}

impl From<mesa_auth::TokenPair> for TokenPairResponse {
    fn from(pair: mesa_auth::TokenPair) -> Self {
        Self {
            access_credential: pair.access_credential,
            refresh_secret: pair.refresh_secret,
            session_id: pair.session_id,
            expires_in: pair.expires_in,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/logout-all", post(logout_all))
        .route("/auth/sessions", get(list_sessions))
        .route("/auth/sessions/:id", delete(revoke_session))
        .route("/auth/me", get(me))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ));

    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .merge(protected)
        .with_state(state)
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let pair = state
        .authority
        .login(LoginInput {
            email: req.email,
            password: req.password,
            device_id: req.device.device_id,
            device_name: req.device.device_name,
            device_type: req.device.device_type,
            ip_address: None,
            user_agent: req.device.user_agent,
            scopes: req.scopes,
        })
        .await
        .map_err(flatten_login_error)?;

    Ok(Json(pair.into()))
}

async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let pair = state.authority.refresh(&req.refresh_secret).await?;
    Ok(Json(pair.into()))
}

async fn logout(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<StatusCode, ApiError> {
    state
        .authority
        .logout(principal.session_id, Some(principal.user_id), "user_logout")
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn logout_all(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<StatusCode, ApiError> {
    state
        .authority
        .logout_all(principal.user_id, Some(principal.user_id), "user_logout_all")
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_sessions(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(credential): Extension<CurrentCredential>,
) -> Result<Json<Vec<SessionView>>, ApiError> {
    let views = state
        .authority
        .list_sessions(principal.user_id, Some(&credential.0))
        .await?;
    Ok(Json(views))
}

async fn revoke_session(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.authority.revoke_session(session_id, &principal).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(
    Extension(principal): Extension<Principal>,
) -> Json<Principal> {
    Json(principal)
}
