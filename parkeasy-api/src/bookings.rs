use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use parkeasy_booking::{BookingDetails, BookingPatch, BookingRequest, PaymentOutcome};
use parkeasy_core::{Booking, BookingStatus, Principal};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<BookingStatus>,
}

fn default_payment_method() -> String {
    "upi".to_string()
}

#[derive(Debug, Deserialize)]
pub struct PayBookingRequest {
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(list_bookings))
        .route("/v1/bookings/{id}", get(get_booking).put(update_booking))
        .route("/v1/bookings/{id}/pay", post(pay_booking))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.bookings.create(&principal, req).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /v1/bookings
/// The caller's own bookings, newest first
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<BookingDetails>>, AppError> {
    Ok(Json(state.bookings.list_for_user(&principal, query.status).await?))
}

/// GET /v1/bookings/{id}
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.read(&principal, booking_id).await?))
}

/// PUT /v1/bookings/{id}
/// Change end time and/or status
pub async fn update_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<Uuid>,
    Json(patch): Json<BookingPatch>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.update(&principal, booking_id, patch).await?))
}

/// POST /v1/bookings/{id}/pay
pub async fn pay_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<PayBookingRequest>,
) -> Result<Json<PaymentOutcome>, AppError> {
    let outcome = state
        .payments
        .pay(&principal, booking_id, &req.payment_method)
        .await?;
    Ok(Json(outcome))
}
