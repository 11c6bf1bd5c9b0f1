use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::auth::AuthState;
use crate::{
    api::error::ApiError,
    store::{Identity, NewService, Service, ServiceView, SharedStore},
};

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct CreateServiceRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Option<f64>,
}

fn service_problems(request: &CreateServiceRequest) -> Vec<String> {
    let mut problems = Vec::new();
    if request.title.trim().is_empty() {
        problems.push("title is required".to_string());
    }
    if request.description.trim().is_empty() {
        problems.push("description is required".to_string());
    }
    match request.price {
        None => problems.push("price is required".to_string()),
        Some(price) if !price.is_finite() || price < 0.0 => {
            problems.push("price must be a non-negative number".to_string());
        }
        Some(_) => {}
    }
    problems
}

#[utoipa::path(
    post,
    path = "/api/services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Service created", body = Service),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Missing, invalid or expired session"),
        (status = 403, description = "Caller is not the administrator"),
    ),
    tag = "services"
)]
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn create_service(
    auth_state: Extension<Arc<AuthState>>,
    store: Extension<SharedStore>,
    identity: Extension<Identity>,
    payload: Result<Json<CreateServiceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;

    let problems = service_problems(&request);
    if !problems.is_empty() {
        return Err(ApiError::Validation(problems));
    }

    let environment = auth_state.config().environment();
    let service = store
        .insert_service(NewService {
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            price: request.price.unwrap_or_default(),
            created_by: identity.id,
        })
        .await
        .map_err(|err| ApiError::internal(&err, environment))?;

    info!(service_id = %service.id, "service created");
    Ok((StatusCode::CREATED, Json(service)))
}

#[utoipa::path(
    get,
    path = "/api/services",
    responses(
        (status = 200, description = "All services with their creator", body = [ServiceView]),
    ),
    tag = "services"
)]
pub async fn list_services(
    auth_state: Extension<Arc<AuthState>>,
    store: Extension<SharedStore>,
) -> Result<Json<Vec<ServiceView>>, ApiError> {
    let services = store
        .list_services()
        .await
        .map_err(|err| ApiError::internal(&err, auth_state.config().environment()))?;
    Ok(Json(services))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, description: &str, price: Option<f64>) -> CreateServiceRequest {
        CreateServiceRequest {
            title: title.to_string(),
            description: description.to_string(),
            price,
        }
    }

    #[test]
    fn accepts_free_and_priced_services() {
        assert!(service_problems(&request("Cleaning", "Two hours", Some(0.0))).is_empty());
        assert!(service_problems(&request("Cleaning", "Two hours", Some(49.5))).is_empty());
    }

    #[test]
    fn rejects_negative_or_missing_price() {
        assert_eq!(
            service_problems(&request("Cleaning", "Two hours", Some(-1.0))),
            vec!["price must be a non-negative number"]
        );
        assert_eq!(
            service_problems(&request("Cleaning", "Two hours", None)),
            vec!["price is required"]
        );
    }

    #[test]
    fn blank_text_fields_are_required() {
        let problems = service_problems(&request("  ", "", Some(1.0)));
        assert_eq!(problems, vec!["title is required", "description is required"]);
    }

    #[test]
    fn missing_fields_deserialize_for_validation() -> anyhow::Result<()> {
        let request: CreateServiceRequest = serde_json::from_str(r#"{"title":"Cleaning"}"#)?;
        assert!(request.price.is_none());
        assert!(request.description.is_empty());
        Ok(())
    }
}
