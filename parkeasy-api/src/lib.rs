use axum::{
    http::Method,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod bookings;
pub mod error;
pub mod lots;
pub mod middleware;
pub mod profile;
pub mod reviews;
pub mod state;
pub mod vehicles;

pub use error::AppError;
pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let authenticated = Router::new()
        .merge(bookings::routes())
        .merge(lots::routes())
        .merge(vehicles::routes())
        .merge(reviews::routes())
        .merge(profile::routes())
        .route_layer(from_fn_with_state(state.clone(), middleware::require_principal));

    // route_layer order: the last one added runs first
    let admin = admin::routes()
        .route_layer(from_fn(middleware::require_admin))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_principal));

    Router::new()
        .route("/health", get(health))
        .merge(authenticated)
        .merge(admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit_middleware))
        .with_state(state)
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
