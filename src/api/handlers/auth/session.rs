//! Session transport: the `token` cookie, with a bearer-header fallback.
//!
//! Set and clear must carry identical attributes or some browsers keep the
//! old cookie around, so both go through [`cookie_attributes`].

use axum::{
    Json,
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, COOKIE, InvalidHeaderValue, SET_COOKIE},
    },
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::error;

use super::{
    state::{AuthConfig, AuthState, Environment},
    types::{LogoutResponse, SessionResponse},
};
use crate::{api::error::ApiError, store::Identity};

pub const SESSION_COOKIE_NAME: &str = "token";

const EXPIRED_AT_EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Production serves a separately hosted frontend, so the cookie must be
/// cross-site (`SameSite=None`), which browsers only accept with `Secure`.
const fn cookie_attributes(environment: Environment) -> &'static str {
    match environment {
        Environment::Production => "Path=/; HttpOnly; Secure; SameSite=None",
        Environment::Development => "Path=/; HttpOnly; SameSite=Lax",
    }
}

/// Build the `Set-Cookie` value carrying a freshly issued session token.
pub(crate) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let attributes = cookie_attributes(config.environment());
    let max_age = config.session_ttl_seconds();
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}={token}; {attributes}; Max-Age={max_age}"
    ))
}

pub(crate) fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let attributes = cookie_attributes(config.environment());
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}=; {attributes}; Max-Age=0; Expires={EXPIRED_AT_EPOCH}"
    ))
}

/// Response headers attaching `token`, or an internal error if the value is
/// not a legal header.
pub(crate) fn session_headers(auth_state: &AuthState, token: &str) -> Result<HeaderMap, ApiError> {
    let config = auth_state.config();
    let cookie = session_cookie(config, token).map_err(|err| {
        ApiError::internal(
            &anyhow::Error::new(err).context("failed to build session cookie"),
            config.environment(),
        )
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok(headers)
}

/// Cookie first; the bearer header only counts when no cookie is present.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    extract_cookie_token(headers).or_else(|| extract_bearer_token(headers))
}

fn extract_cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            let val = val.trim();
            (key.trim() == SESSION_COOKIE_NAME && !val.is_empty()).then(|| val.to_string())
        })
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = LogoutResponse)
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // No token check: the cookie is cleared whether or not a session existed.
    let mut headers = HeaderMap::new();
    match clear_session_cookie(auth_state.config()) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build clearing cookie: {err}"),
    }

    (
        StatusCode::OK,
        headers,
        Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

#[utoipa::path(
    get,
    path = "/api/auth/validate",
    responses(
        (status = 200, description = "Session is valid", body = SessionResponse),
        (status = 401, description = "Missing, invalid or expired session")
    ),
    tag = "auth"
)]
pub async fn validate(Extension(identity): Extension<Identity>) -> impl IntoResponse {
    Json(SessionResponse::from_identity(&identity, identity.role))
}
