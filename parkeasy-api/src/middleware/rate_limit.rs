use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use parkeasy_store::redis_repo::rate_limit_key;

use crate::state::AppState;

const WINDOW_SECONDS: i64 = 60;

/// Fixed-window limit per client IP. Redis failures let the request through.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(limit) = &state.rate_limit else {
        return next.run(req).await;
    };
    let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>().copied() else {
        return next.run(req).await;
    };

    let key = rate_limit_key(&addr.ip().to_string(), WINDOW_SECONDS, Utc::now().timestamp());
    match limit
        .redis
        .check_rate_limit(&key, limit.requests_per_minute, WINDOW_SECONDS)
        .await
    {
        Ok(true) => next.run(req).await,
        Ok(false) => (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response(),
        Err(e) => {
            // Fail open
            tracing::warn!(error = %e, "Rate limiter unavailable");
            next.run(req).await
        }
    }
}
