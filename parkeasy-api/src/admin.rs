use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use parkeasy_booking::{realtime_stats, BookingDetails, RealtimeStats};
use parkeasy_catalog::{
    BulkSlotOutcome, BulkSlotRequest, LotPatch, NewLot, NewSlot, NewUser, SlotPatch, UserDetails,
    UserPage, UserPatch, UserQuery,
};
use parkeasy_core::{ParkingLot, ParkingSlot, Principal, User};
use uuid::Uuid;

use crate::bookings::StatusQuery;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/bookings", get(list_all_bookings))
        .route("/v1/admin/lots", post(create_lot))
        .route("/v1/admin/lots/{id}", put(update_lot).delete(delete_lot))
        .route("/v1/admin/lots/{id}/slots", post(create_slot))
        .route("/v1/admin/lots/{id}/slots/bulk", post(create_slots_bulk))
        .route("/v1/admin/slots/{id}", put(update_slot).delete(delete_slot))
        .route("/v1/admin/users", get(list_users).post(create_user))
        .route(
            "/v1/admin/users/{id}",
            get(get_user_details).put(update_user).delete(delete_user),
        )
        .route("/v1/admin/stats/realtime", get(get_realtime_stats))
}

// ============================================================================
// Bookings
// ============================================================================

/// GET /v1/admin/bookings?status=
pub async fn list_all_bookings(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<BookingDetails>>, AppError> {
    Ok(Json(state.bookings.list_all(query.status).await?))
}

// ============================================================================
// Lot & Slot Management
// ============================================================================

/// POST /v1/admin/lots
pub async fn create_lot(
    State(state): State<AppState>,
    Json(req): Json<NewLot>,
) -> Result<(StatusCode, Json<ParkingLot>), AppError> {
    let lot = state.lots.create(req).await?;
    Ok((StatusCode::CREATED, Json(lot)))
}

/// PUT /v1/admin/lots/{id}
pub async fn update_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
    Json(patch): Json<LotPatch>,
) -> Result<Json<ParkingLot>, AppError> {
    Ok(Json(state.lots.update(lot_id, patch).await?))
}

/// DELETE /v1/admin/lots/{id}
pub async fn delete_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.lots.delete(lot_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/admin/lots/{id}/slots
pub async fn create_slot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
    Json(req): Json<NewSlot>,
) -> Result<(StatusCode, Json<ParkingSlot>), AppError> {
    let slot = state.inventory.create_slot(lot_id, req).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

/// POST /v1/admin/lots/{id}/slots/bulk
pub async fn create_slots_bulk(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
    Json(req): Json<BulkSlotRequest>,
) -> Result<(StatusCode, Json<BulkSlotOutcome>), AppError> {
    let outcome = state.inventory.create_bulk(lot_id, req).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// PUT /v1/admin/slots/{id}
pub async fn update_slot(
    State(state): State<AppState>,
    Path(slot_id): Path<Uuid>,
    Json(patch): Json<SlotPatch>,
) -> Result<Json<ParkingSlot>, AppError> {
    Ok(Json(state.inventory.update_slot(slot_id, patch).await?))
}

/// DELETE /v1/admin/slots/{id}
pub async fn delete_slot(
    State(state): State<AppState>,
    Path(slot_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.inventory.delete_slot(slot_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// User Management
// ============================================================================

/// GET /v1/admin/users?role=&search=&skip=&limit=
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<UserPage>, AppError> {
    Ok(Json(state.accounts.list_users(&query).await?))
}

/// POST /v1/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.accounts.create_user(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /v1/admin/users/{id}
/// User with booking stats and vehicles
pub async fn get_user_details(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserDetails>, AppError> {
    Ok(Json(state.accounts.user_details(user_id).await?))
}

/// PUT /v1/admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.accounts.update_user(user_id, patch).await?))
}

/// DELETE /v1/admin/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.accounts.delete_user(&principal, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Stats
// ============================================================================

/// GET /v1/admin/stats/realtime
pub async fn get_realtime_stats(
    State(state): State<AppState>,
) -> Result<Json<RealtimeStats>, AppError> {
    Ok(Json(realtime_stats(state.store.as_ref()).await?))
}
