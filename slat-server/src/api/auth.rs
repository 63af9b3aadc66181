//! Authentication middleware
//!
//! Protected routes carry `Authorization: Bearer <JWT>` signed HS256 with
//! the `api_jwt_secret` setting. An empty secret disables ALL auth checking
//! (development/test mode). Token issuance is external; this layer only
//! verifies and role-gates.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use slat_common::auth::{verify_token, TokenError};
use tracing::warn;

use crate::AppState;

/// Middleware for admin-only routes
pub async fn admin_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    require_role(&state, &request, "admin")?;
    Ok(next.run(request).await)
}

/// Middleware for annotator routes
pub async fn user_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    require_role(&state, &request, "user")?;
    Ok(next.run(request).await)
}

fn require_role(state: &AppState, request: &Request, required_role: &str) -> Result<(), AuthError> {
    // Empty secret disables auth checking entirely
    if state.jwt_secret.is_empty() {
        return Ok(());
    }

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    let claims = verify_token(token, &state.jwt_secret).map_err(|e| match e {
        TokenError::Expired => AuthError::Expired,
        TokenError::Invalid(reason) => AuthError::InvalidToken(reason),
    })?;

    if claims.role != required_role {
        warn!(
            "User {} with role '{}' denied access to '{}' route",
            claims.sub, claims.role, required_role
        );
        return Err(AuthError::Forbidden);
    }

    Ok(())
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken(String),
    Expired,
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::MissingToken => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Missing bearer token".to_string())
            }
            AuthError::InvalidToken(reason) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                format!("Invalid token: {}", reason),
            ),
            AuthError::Expired => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Token expired".to_string())
            }
            AuthError::Forbidden => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", "Insufficient role".to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
