//! Access tokens: short-lived proof that first-factor login recently succeeded.
//!
//! Tokens are self-contained (never stored server-side) and bound to the
//! `accessToken` cookie, whose `Max-Age` is set from the same duration that
//! signs `exp`.

use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::app_error::{AppError, AppResult};

pub const ACCESS_COOKIE: &str = "accessToken";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    /// Marks the token as a session access token. A first-factor bearer
    /// token must never pass access-token verification.
    pub access: bool,
    pub exp: i64,
    pub iat: i64,
}

pub fn issue(subject: &str, secret: &secrecy::SecretString, ttl: Duration) -> AppResult<String> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let claims = Claims {
        sub: subject.to_string(),
        access: true,
        iat: now,
        exp: now + ttl.whole_seconds(),
    };
    let header = Header::new(Algorithm::HS256);
    encode(
        &header,
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

/// Hard verification, used as a chain gate. Fails with `InvalidAccessToken`
/// on a bad signature, expiry, a subject mismatch, or a missing/false
/// `access` marker.
pub fn verify(token: &str, expected_subject: &str, secret: &secrecy::SecretString) -> AppResult<()> {
    let mut validation = Validation::new(Algorithm::HS256);
    // The cookie and the signed expiry elapse together; no slack.
    validation.leeway = 0;
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::InvalidAccessToken)?
    .claims;

    if !claims.access || claims.sub != expected_subject {
        return Err(AppError::InvalidAccessToken);
    }
    Ok(())
}

/// Soft variant for read endpoints that annotate the request instead of
/// rejecting it.
pub fn check_soft(token: &str, expected_subject: &str, secret: &secrecy::SecretString) -> bool {
    verify(token, expected_subject, secret).is_ok()
}

pub fn access_cookie(token: String, ttl: Duration) -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE, token))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .max_age(ttl)
        .build()
}

pub fn clear_access_cookie() -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE, ""))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .max_age(Duration::seconds(0))
        .build()
}
