//! Session gate.
//!
//! Flow Overview: read the session token (cookie, then bearer header), verify
//! it, resolve the subject to a stored identity, and attach that identity to
//! the request so downstream handlers can take `Extension<Identity>`.

use axum::{
    extract::{Extension, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error};

use super::{session::extract_session_token, state::AuthState};
use crate::{
    api::error::ApiError,
    store::{Identity, SharedStore, Store},
};

/// Resolve request headers into an identity, or `Unauthenticated`.
///
/// Missing token, bad token, unknown subject and store failures all look the
/// same to the client; only the logs tell them apart.
pub async fn resolve_identity(
    headers: &HeaderMap,
    auth_state: &AuthState,
    store: &dyn Store,
) -> Result<Identity, ApiError> {
    let Some(token) = extract_session_token(headers) else {
        return Err(ApiError::Unauthenticated);
    };
    let Some(subject) = auth_state.tokens().subject(&token) else {
        return Err(ApiError::Unauthenticated);
    };

    match store.find_identity(subject).await {
        Ok(Some(identity)) => Ok(identity),
        Ok(None) => {
            debug!(user_id = %subject, "session subject no longer exists");
            Err(ApiError::Unauthenticated)
        }
        Err(err) => {
            error!("Failed to resolve session identity: {err:#}");
            Err(ApiError::Unauthenticated)
        }
    }
}

/// Middleware admitting only requests with a valid session.
///
/// # Errors
/// Returns `Unauthenticated` when the session cannot be resolved.
pub async fn require_session(
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(store): Extension<SharedStore>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = resolve_identity(request.headers(), &auth_state, store.as_ref()).await?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
