use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    password::hash_password_blocking,
    session::session_headers,
    state::AuthState,
    types::{RegisterRequest, RegisterResponse},
    utils::registration_problems,
};
use crate::{
    api::error::ApiError,
    store::{InsertOutcome, NewUser, Role, SharedStore},
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Identity created and session cookie set", body = RegisterResponse),
        (status = 400, description = "Validation failed or email already registered"),
    ),
    tag = "auth"
)]
#[instrument(skip(auth_state, store, payload))]
pub async fn register(
    auth_state: Extension<Arc<AuthState>>,
    store: Extension<SharedStore>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;

    let problems = registration_problems(&request);
    if !problems.is_empty() {
        return Err(ApiError::Validation(problems));
    }

    let environment = auth_state.config().environment();
    let password_hash = hash_password_blocking(request.password)
        .await
        .map_err(|err| ApiError::internal(&err, environment))?;

    // New identities always start as `user`; elevation only happens at login.
    let new_user = NewUser {
        name: request.name.trim().to_string(),
        email: request.email,
        password_hash,
        role: Role::User,
    };

    let identity = match store
        .insert_user(new_user)
        .await
        .map_err(|err| ApiError::internal(&err, environment))?
    {
        InsertOutcome::Created(identity) => identity,
        InsertOutcome::Conflict => {
            debug!("registration rejected: email already registered");
            return Err(ApiError::Conflict("Email is already registered".to_string()));
        }
    };

    let token = auth_state
        .tokens()
        .issue(identity.id)
        .map_err(|err| ApiError::internal(&err, environment))?;
    let headers = session_headers(&auth_state, &token)?;

    Ok((
        StatusCode::CREATED,
        headers,
        Json(RegisterResponse {
            user: identity.summary(),
        }),
    ))
}
