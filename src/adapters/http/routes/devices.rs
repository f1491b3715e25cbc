//! Device registration and listing; the device population feeds the
//! capability resolver.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::{
    adapters::http::{app_state::AppState, routes::common},
    app_error::AppResult,
    application::validation::{IdentityCheck, RequiredField, ValidationChain},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(register).get(list))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RegisterPayload {
    device_id: Option<String>,
    kind: Option<String>,
    name: Option<String>,
}

async fn register(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
    Json(payload): Json<RegisterPayload>,
) -> AppResult<impl IntoResponse> {
    let facts = common::request_facts(&headers, &cookies)
        .with_param("deviceId", payload.device_id.clone())
        .with_param("kind", payload.kind.clone());

    let ctx = ValidationChain::new()
        .with(IdentityCheck::new(app_state.identity.clone()))
        .with(RequiredField::new("deviceId"))
        .with(RequiredField::new("kind"))
        .run(&facts)
        .await?;
    let subject = ctx.require_subject()?;

    let record = app_state
        .accounts
        .register_device(
            subject,
            facts.param("deviceId").unwrap_or_default(),
            facts.param("kind").unwrap_or_default(),
            payload.name.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

async fn list(
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

    let devices = app_state.accounts.list_devices(subject).await?;
    Ok(Json(devices))
}
