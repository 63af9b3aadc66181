//! Bearer-token verification primitives
//!
//! SLAT does not issue tokens (provisioning is external); it only verifies
//! HS256-signed JWTs whose claims carry the authenticated user id and role.
//! The signing secret lives in the `settings` table under `api_jwt_secret`.
//! An empty secret disables auth checking entirely (development/test mode).

use crate::{Error, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Claims carried by a SLAT bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user id (UUID as text)
    pub sub: String,
    /// Role granted to this user: "admin" or "user"
    pub role: String,
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,
}

/// Token verification failures
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("Token expired")]
    Expired,
}

/// Verify an HS256 bearer token and return its claims.
///
/// Expiry is validated by the library; clock skew tolerance is the
/// jsonwebtoken default (60 seconds).
pub fn verify_token(token: &str, secret: &str) -> std::result::Result<Claims, TokenError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e.to_string()),
    })
}

/// Encode a token for the given user id and role.
///
/// The service itself never mints tokens for callers; this helper exists for
/// provisioning scripts and tests that need a valid token against a known
/// secret.
pub fn encode_token(user_id: &str, role: &str, secret: &str, ttl_seconds: i64) -> Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: chrono::Utc::now().timestamp() + ttl_seconds,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to encode token: {}", e)))
}

/// Load the API signing secret from the settings table.
///
/// Returns an empty string when the setting is missing or empty, which
/// callers must treat as "auth disabled".
pub async fn load_api_secret(pool: &SqlitePool) -> Result<String> {
    let secret: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'api_jwt_secret'")
            .fetch_optional(pool)
            .await?;

    Ok(secret.unwrap_or_default())
}
