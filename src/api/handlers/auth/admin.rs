//! Administrator gate, login elevation and bootstrap seeding.
//!
//! Flow Overview:
//! 1) The session gate has already attached an [`Identity`].
//! 2) The admin gate requires both the stored `admin` role and an exact match
//!    on the configured administrator email.
//! 3) Logging in with the administrator email force-sets the stored role to
//!    `admin`. This is the only path that promotes an identity.
//!
//! Security boundaries:
//! - A stored `admin` role alone never grants access.
//! - Role changes are always logged with the subject id.

use anyhow::{Context, Result, anyhow};
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{password::hash_password_blocking, state::AuthState};
use crate::{
    api::error::ApiError,
    store::{Identity, InsertOutcome, NewUser, Role, Store},
};

/// Middleware admitting only the administrator. Must sit inside
/// [`super::require_session`].
///
/// # Errors
/// Returns `Forbidden` for any non-administrator identity.
pub async fn require_admin(
    Extension(auth_state): Extension<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(identity) = request.extensions().get::<Identity>() else {
        error!("Admin gate reached without a resolved identity");
        return Err(ApiError::Internal {
            message: "Internal server error".to_string(),
            detail: None,
        });
    };

    if !identity.is_administrator(auth_state.config().admin_email()) {
        warn!(user_id = %identity.id, role = %identity.role, "admin access denied");
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(request).await)
}

/// Persist the `admin` role for the administrator identity.
///
/// # Errors
/// Returns an error if `identity` does not carry the administrator email, if
/// the identity vanished, or if the store fails.
pub(super) async fn elevate_to_admin(
    store: &dyn Store,
    identity: &Identity,
    admin_email: &str,
) -> Result<()> {
    if !identity.has_admin_email(admin_email) {
        return Err(anyhow!(
            "refusing to elevate {} without the administrator email",
            identity.id
        ));
    }

    let updated = store
        .set_user_role(identity.id, Role::Admin)
        .await
        .context("failed to persist admin role")?;
    if !updated {
        return Err(anyhow!("identity {} vanished during elevation", identity.id));
    }

    if identity.role == Role::Admin {
        info!(user_id = %identity.id, "administrator role re-asserted");
    } else {
        info!(
            user_id = %identity.id,
            from = %identity.role,
            to = %Role::Admin,
            "identity elevated to administrator"
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    Elevated,
    AlreadyPresent,
}

/// Make sure the administrator identity exists at startup.
///
/// An existing identity with the administrator email keeps its password; only
/// its role is corrected.
///
/// # Errors
/// Returns an error if the password is empty, hashing fails, or the store fails.
pub async fn seed_admin(
    store: &dyn Store,
    admin_email: &str,
    password: &SecretString,
) -> Result<SeedOutcome> {
    if admin_email.is_empty() {
        return Err(anyhow!("administrator email must not be empty"));
    }

    if let Some(existing) = store.find_credential_by_email(admin_email).await? {
        if existing.identity.role == Role::Admin {
            return Ok(SeedOutcome::AlreadyPresent);
        }
        elevate_to_admin(store, &existing.identity, admin_email).await?;
        return Ok(SeedOutcome::Elevated);
    }

    let password_hash = hash_password_blocking(password.expose_secret().to_string()).await?;
    let new_user = NewUser {
        name: "Admin".to_string(),
        email: admin_email.to_string(),
        password_hash,
        role: Role::Admin,
    };

    match store.insert_user(new_user).await? {
        InsertOutcome::Created(identity) => {
            info!(user_id = %identity.id, "administrator identity seeded");
            Ok(SeedOutcome::Created)
        }
        // Lost a race with a concurrent registration; treat as present.
        InsertOutcome::Conflict => Ok(SeedOutcome::AlreadyPresent),
    }
}
