//! Cross-service identity handoffs.
//!
//! Creation requires a full session (first factor + access cookie); the
//! resolving side is a cooperating service that only holds the hash.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::{
    adapters::http::{app_state::AppState, routes::common},
    app_error::AppResult,
    application::validation::{
        AccessTokenCheck, IdentityCheck, RequiredField, ValidationChain,
    },
    use_cases::exchange::generate_secret,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/resolve", post(resolve))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CreatePayload {
    secret: Option<String>,
}

async fn create(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
    Json(payload): Json<CreatePayload>,
) -> AppResult<impl IntoResponse> {
    let facts = common::request_facts(&headers, &cookies);
    let ctx = ValidationChain::new()
        .with(IdentityCheck::new(app_state.identity.clone()))
        .with(AccessTokenCheck::new(app_state.config.clone()))
        .run(&facts)
        .await?;
    let subject = ctx.require_subject()?;

    // Callers may bring their own handoff secret; otherwise entropy is
    // generated here and never returned.
    let secret = payload
        .secret
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(generate_secret);

    let hash = app_state.exchange.put(subject, &secret).await?;
    Ok((StatusCode::CREATED, Json(json!({ "hash": hash }))))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ResolvePayload {
    hash: Option<String>,
}

async fn resolve(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
    Json(payload): Json<ResolvePayload>,
) -> AppResult<impl IntoResponse> {
    let facts = common::request_facts(&headers, &cookies)
        .with_param("hash", payload.hash.clone());
    ValidationChain::new()
        .with(RequiredField::new("hash"))
        .run(&facts)
        .await?;

    let subject = app_state
        .exchange
        .resolve(facts.param("hash").unwrap_or_default())
        .await?;
    Ok(Json(json!({ "subject": subject })))
}
