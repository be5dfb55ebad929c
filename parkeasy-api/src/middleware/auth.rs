use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use parkeasy_core::{Principal, UserRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

impl TryFrom<Claims> for Principal {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::AuthenticationError("Invalid token subject".to_string()))?;
        let role: UserRole = claims
            .role
            .parse()
            .map_err(|_| AppError::AuthenticationError("Invalid token role".to_string()))?;
        Ok(Principal { user_id, email: claims.email, role })
    }
}

/// Mint a token for `principal`. Token issuance is not part of the service;
/// this exists for tests and local tooling.
pub fn issue_token(
    secret: &str,
    principal: &Principal,
    ttl_seconds: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: principal.user_id.to_string(),
        email: principal.email.clone(),
        role: principal.role.as_str().to_string(),
        exp: (Utc::now().timestamp() + ttl_seconds).max(0) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

// ============================================================================
// Authentication Middleware
// ============================================================================

/// Turn a valid bearer token into a `Principal` request extension.
pub async fn require_principal(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected token");
        AppError::AuthenticationError("Invalid or expired token".to_string())
    })?;

    let principal = Principal::try_from(token_data.claims)?;
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

// ============================================================================
// Admin Middleware
// ============================================================================

/// Runs inside `require_principal`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    if !principal.is_admin() {
        return Err(AppError::AuthorizationError("Admin access required".to_string()));
    }

    Ok(next.run(req).await)
}
