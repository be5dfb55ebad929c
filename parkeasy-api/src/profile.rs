use axum::{extract::State, routing::get, Extension, Json, Router};
use parkeasy_catalog::{BookingSummary, ProfilePatch};
use parkeasy_core::{Principal, User};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/me", get(get_profile).put(update_profile))
        .route("/v1/me/stats", get(get_booking_summary))
}

/// GET /v1/me
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.accounts.profile(&principal).await?))
}

/// PUT /v1/me
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<ProfilePatch>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.accounts.update_profile(&principal, req).await?))
}

/// GET /v1/me/stats
pub async fn get_booking_summary(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<BookingSummary>, AppError> {
    Ok(Json(state.accounts.booking_summary(&principal).await?))
}
