use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{BookingUpdated, CreateBookingRequest, UpdateStatusRequest},
    repo::TravelBooking,
};
use crate::{auth::AuthUser, error::ApiError, extractors::JsonBody, state::AppState};

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/travelbookings", get(list_bookings).post(create_booking))
        .route("/travelbookings/:id", put(update_booking_status))
}

/// POST /travelbookings, open to customers without an account.
#[instrument(skip(state, body))]
pub async fn create_booking(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateBookingRequest>,
) -> Result<(StatusCode, Json<TravelBooking>), ApiError> {
    if let Some(field) = body.missing_field() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }
    let booking = TravelBooking::create(&state.db, &body).await?;
    info!(booking_id = %booking.id, "booking created");
    Ok((StatusCode::CREATED, Json(booking)))
}

#[instrument(skip_all)]
pub async fn list_bookings(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<TravelBooking>>, ApiError> {
    Ok(Json(TravelBooking::list_all(&state.db).await?))
}

#[instrument(skip(state, _auth, body))]
pub async fn update_booking_status(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(body): JsonBody<UpdateStatusRequest>,
) -> Result<Json<BookingUpdated>, ApiError> {
    let status = body
        .booking_status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Booking status is required.".into()))?;

    let Some(booking) = TravelBooking::update_status(&state.db, id, status).await? else {
        return Err(ApiError::NotFound("Booking not found.".into()));
    };

    info!(booking_id = %booking.id, status = %booking.booking_status, "booking status updated");
    Ok(Json(BookingUpdated {
        message: "Booking updated successfully.".into(),
        booking,
    }))
}
