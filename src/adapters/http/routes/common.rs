//! Shared request/response helpers for the route modules.

use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::app_error::{AppError, AppResult};
use crate::application::jwt;
use crate::application::validation::RequestFacts;

/// Lift the chain-relevant parts of the request into transport-agnostic
/// facts.
pub(crate) fn request_facts(headers: &HeaderMap, cookies: &CookieJar) -> RequestFacts {
    RequestFacts::new()
        .with_authorization(
            headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
        )
        .with_access_token(cookies.get(jwt::ACCESS_COOKIE).map(|c| c.value().to_owned()))
}

/// Appends a cookie to the headers, handling parse errors gracefully
pub(crate) fn append_cookie(headers: &mut HeaderMap, cookie: Cookie<'_>) -> AppResult<()> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|_| AppError::Internal("Failed to build cookie header".into()))?;
    headers.append("set-cookie", value);
    Ok(())
}
