//! Password login.
//!
//! Flow Overview:
//! 1) Look up the credential by exact email and verify the password.
//! 2) If the email is the configured administrator email, persist the `admin`
//!    role, re-read the credential and verify the password against it again.
//! 3) Issue a session token and set the cookie.
//!
//! Every credential failure answers with the same `Invalid credentials` body
//! so callers cannot probe which emails exist.

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    admin::elevate_to_admin,
    password::{DECOY_DIGEST, verify_password_blocking},
    session::session_headers,
    state::{AuthState, Environment},
    types::{LoginRequest, SessionResponse},
};
use crate::{
    api::error::ApiError,
    store::{Credential, Role, SharedStore, Store},
};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session cookie set", body = SessionResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
#[instrument(skip(auth_state, store, payload))]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    store: Extension<SharedStore>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let config = auth_state.config();
    let environment = config.environment();

    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::InvalidCredentials);
    }

    let credential = verified_credential(store.as_ref(), &request, environment).await?;

    let (identity, role) = if credential.identity.has_admin_email(config.admin_email()) {
        elevate_to_admin(store.as_ref(), &credential.identity, config.admin_email())
            .await
            .map_err(|err| ApiError::internal(&err, environment))?;
        // Re-read so the session reflects what is persisted, not what we wrote.
        let elevated = verified_credential(store.as_ref(), &request, environment).await?;
        (elevated.identity, Role::Admin)
    } else {
        (credential.identity, Role::User)
    };

    let token = auth_state
        .tokens()
        .issue(identity.id)
        .map_err(|err| ApiError::internal(&err, environment))?;
    let headers = session_headers(&auth_state, &token)?;

    Ok((
        StatusCode::OK,
        headers,
        Json(SessionResponse::from_identity(&identity, role)),
    ))
}

async fn verified_credential(
    store: &dyn Store,
    request: &LoginRequest,
    environment: Environment,
) -> Result<Credential, ApiError> {
    let credential = store
        .find_credential_by_email(&request.email)
        .await
        .map_err(|err| ApiError::internal(&err, environment))?;

    // Unknown emails still pay for a full Argon2 verification.
    let digest = credential
        .as_ref()
        .map_or(DECOY_DIGEST, |credential| credential.password_hash.as_str());
    let matches = verify_password_blocking(request.password.clone(), digest.to_string())
        .await
        .map_err(|err| ApiError::internal(&err, environment))?;

    match credential {
        Some(credential) if matches => Ok(credential),
        Some(credential) => {
            debug!(user_id = %credential.identity.id, "login rejected: wrong password");
            Err(ApiError::InvalidCredentials)
        }
        None => {
            debug!("login rejected: unknown email");
            Err(ApiError::InvalidCredentials)
        }
    }
}
