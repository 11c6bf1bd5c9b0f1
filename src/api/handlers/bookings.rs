use anyhow::anyhow;
use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::AuthState;
use crate::{
    api::{error::ApiError, lifecycle::BookingLifecycle},
    store::{BookingView, Identity, NewBooking, SharedStore},
};

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub service_id: String,
}

fn parse_service_id(raw: &str) -> Result<Uuid, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::validation("serviceId is required"));
    }
    Uuid::parse_str(raw).map_err(|_| ApiError::validation("serviceId is not a valid id"))
}

#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created as pending", body = BookingView),
        (status = 400, description = "Invalid or unknown service"),
        (status = 401, description = "Missing, invalid or expired session"),
    ),
    tag = "bookings"
)]
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn create_booking(
    auth_state: Extension<Arc<AuthState>>,
    store: Extension<SharedStore>,
    lifecycle: Extension<Arc<BookingLifecycle>>,
    identity: Extension<Identity>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let service_id = parse_service_id(&request.service_id)?;
    let environment = auth_state.config().environment();

    let service = store
        .find_service(service_id)
        .await
        .map_err(|err| ApiError::internal(&err, environment))?;
    if service.is_none() {
        debug!(service_id = %service_id, "booking rejected: unknown service");
        return Err(ApiError::validation("service not found"));
    }

    let booking = store
        .insert_booking(NewBooking {
            user_id: identity.id,
            service_id,
        })
        .await
        .map_err(|err| ApiError::internal(&err, environment))?;

    lifecycle.schedule_completion(booking.id);

    let view = store
        .find_booking(booking.id)
        .await
        .map_err(|err| ApiError::internal(&err, environment))?
        .ok_or_else(|| {
            ApiError::internal(
                &anyhow!("booking {} missing right after insert", booking.id),
                environment,
            )
        })?;

    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    responses(
        (status = 200, description = "Caller's bookings, newest first", body = [BookingView]),
        (status = 401, description = "Missing, invalid or expired session"),
    ),
    tag = "bookings"
)]
pub async fn list_bookings(
    auth_state: Extension<Arc<AuthState>>,
    store: Extension<SharedStore>,
    identity: Extension<Identity>,
) -> Result<Json<Vec<BookingView>>, ApiError> {
    let bookings = store
        .list_bookings_for_user(identity.id)
        .await
        .map_err(|err| ApiError::internal(&err, auth_state.config().environment()))?;
    Ok(Json(bookings))
}
