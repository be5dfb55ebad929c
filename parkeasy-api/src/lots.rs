use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use parkeasy_catalog::LotSearch;
use parkeasy_core::{ParkingLot, ParkingSlot, SlotStatus};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub status: Option<SlotStatus>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/lots", get(search_lots))
        .route("/v1/lots/{id}", get(get_lot))
        .route("/v1/lots/{id}/slots", get(list_slots))
}

/// GET /v1/lots?latitude=&longitude=&max_distance=&is_active=
pub async fn search_lots(
    State(state): State<AppState>,
    Query(query): Query<LotSearch>,
) -> Result<Json<Vec<ParkingLot>>, AppError> {
    Ok(Json(state.lots.search(&query).await?))
}

/// GET /v1/lots/{id}
pub async fn get_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> Result<Json<ParkingLot>, AppError> {
    Ok(Json(state.lots.get(lot_id).await?))
}

/// GET /v1/lots/{id}/slots?status=
pub async fn list_slots(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Vec<ParkingSlot>>, AppError> {
    Ok(Json(state.lots.list_slots(lot_id, query.status).await?))
}
