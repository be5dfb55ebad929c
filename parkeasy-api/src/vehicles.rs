use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use parkeasy_catalog::NewVehicle;
use parkeasy_core::{Principal, Vehicle};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/vehicles", post(register_vehicle).get(list_vehicles))
        .route("/v1/vehicles/{id}", get(get_vehicle).delete(delete_vehicle))
}

/// POST /v1/vehicles
pub async fn register_vehicle(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<NewVehicle>,
) -> Result<(StatusCode, Json<Vehicle>), AppError> {
    let vehicle = state.accounts.register_vehicle(&principal, req).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// GET /v1/vehicles
pub async fn list_vehicles(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    Ok(Json(state.accounts.list_vehicles(&principal).await?))
}

/// GET /v1/vehicles/{id}
pub async fn get_vehicle(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<Vehicle>, AppError> {
    Ok(Json(state.accounts.get_vehicle(&principal, vehicle_id).await?))
}

/// DELETE /v1/vehicles/{id}
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.accounts.delete_vehicle(&principal, vehicle_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
