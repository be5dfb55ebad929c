use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use parkeasy_catalog::NewReview;
use parkeasy_core::{Principal, Review};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reviews", post(create_review))
        .route("/v1/reviews/lot/{lot_id}", get(list_lot_reviews))
        .route("/v1/reviews/{id}", delete(delete_review))
}

/// POST /v1/reviews
pub async fn create_review(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = state.reviews.create(&principal, req).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /v1/reviews/lot/{lot_id}
pub async fn list_lot_reviews(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(state.reviews.list_for_lot(lot_id).await?))
}

/// DELETE /v1/reviews/{id}
/// Author or admin
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(review_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.reviews.delete(&principal, review_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
