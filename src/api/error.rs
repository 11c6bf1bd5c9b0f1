//! HTTP-facing error taxonomy.
//!
//! Gates and handlers return [`ApiError`]; its `IntoResponse` impl owns the
//! status codes and bodies so every route rejects the same way.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use super::handlers::auth::Environment;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Please authenticate")]
    Unauthenticated,
    #[error("Access denied")]
    Forbidden,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("{0}")]
    Conflict(String),
    #[error("{message}")]
    Internal {
        message: String,
        detail: Option<String>,
    },
}

impl ApiError {
    /// Wrap an infrastructure failure. The error chain is logged always and
    /// echoed to the client only outside production.
    #[must_use]
    pub fn internal(err: &anyhow::Error, environment: Environment) -> Self {
        error!("internal error: {err:#}");
        Self::Internal {
            message: "Internal server error".to_string(),
            detail: (!environment.is_production()).then(|| format!("{err:?}")),
        }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Unauthenticated | Self::Forbidden | Self::InvalidCredentials => {
                json!({ "error": self.to_string() })
            }
            Self::Validation(details) => json!({
                "error": self.to_string(),
                "details": details,
            }),
            Self::Conflict(message) => json!({
                "error": message,
                "details": [message],
            }),
            Self::Internal { message, detail } => match detail {
                Some(stack) => json!({ "message": message, "stack": stack }),
                None => json!({ "message": message }),
            },
        };
        (status, Json(body)).into_response()
    }
}
