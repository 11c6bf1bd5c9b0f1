//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::store::{Identity, Role, UserSummary};

// Missing fields deserialize as empty strings so validation can name them.

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub user: UserSummary,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub user: SessionUser,
}

impl SessionResponse {
    /// `role` is passed explicitly: login reports the role it decided on,
    /// which may differ from what the identity carried before elevation.
    pub(crate) fn from_identity(identity: &Identity, role: Role) -> Self {
        Self {
            user: SessionUser {
                id: identity.id,
                name: identity.name.clone(),
                email: identity.email.clone(),
                role,
            },
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LogoutResponse {
    pub message: String,
}
