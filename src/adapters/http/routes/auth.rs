//! First-factor login, session introspection, and the SMS second factor.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use crate::{
    adapters::http::{app_state::AppState, routes::common},
    app_error::AppResult,
    application::jwt,
    application::validation::{IdentityCheck, ValidationChain},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/session", get(session).delete(logout))
        .route("/sms", post(start_sms))
}

/// Exchange a verified first-factor token for the `accessToken` cookie.
async fn login(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
) -> AppResult<impl IntoResponse> {
    let facts = common::request_facts(&headers, &cookies);
    let ctx = ValidationChain::new()
        .with(IdentityCheck::new(app_state.identity.clone()))
        .run(&facts)
        .await?;
    let subject = ctx.require_subject()?.to_string();

    app_state.accounts.login(&subject).await?;

    let token = jwt::issue(
        &subject,
        &app_state.config.jwt_secret,
        app_state.config.access_token_ttl,
    )?;
    let mut response_headers = HeaderMap::new();
    common::append_cookie(
        &mut response_headers,
        jwt::access_cookie(token, app_state.config.access_token_ttl),
    )?;

    Ok((
        StatusCode::OK,
        response_headers,
        Json(json!({ "subject": subject })),
    ))
}

/// Read endpoint: annotates instead of rejecting, so a caller with an
/// expired cookie still learns who they are and that they need to re-login.
async fn session(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
) -> AppResult<impl IntoResponse> {
    let facts = common::request_facts(&headers, &cookies);
    let ctx = ValidationChain::new()
        .with(IdentityCheck::new(app_state.identity.clone()))
        .run(&facts)
        .await?;
    let subject = ctx.require_subject()?;

    let access = facts
        .access_token
        .as_deref()
        .map(|token| jwt::check_soft(token, subject, &app_state.config.jwt_secret))
        .unwrap_or(false);

    Ok(Json(json!({ "subject": subject, "access": access })))
}

async fn logout() -> AppResult<impl IntoResponse> {
    // Always clear the cookie; there is no server-side session to tear down.
    let mut response_headers = HeaderMap::new();
    common::append_cookie(&mut response_headers, jwt::clear_access_cookie())?;
    Ok((StatusCode::NO_CONTENT, response_headers))
}

async fn start_sms(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
) -> AppResult<impl IntoResponse> {
    let facts = common::request_facts(&headers, &cookies);
    let ctx = ValidationChain::new()
        .with(IdentityCheck::new(app_state.identity.clone()))
        .run(&facts)
        .await?;
    let subject = ctx.require_subject()?;

    app_state.accounts.start_sms_challenge(subject).await?;
    Ok(StatusCode::ACCEPTED)
}
