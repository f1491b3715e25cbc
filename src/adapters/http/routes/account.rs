//! Account mutation: the phone-number change behind the conditional
//! second-factor gate.

use axum::{
    Json, Router, extract::State, http::HeaderMap, response::IntoResponse, routing::patch,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::{
    adapters::http::{app_state::AppState, routes::common},
    app_error::AppResult,
    application::validation::{ConditionalSecondFactorCheck, EmailVerifiedCheck, ValidationChain},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", patch(update))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct UpdatePayload {
    phone_number: Option<String>,
}

/// Requires a fully onboarded account. The second-factor gate only engages
/// when the payload actually changes the phone number and the account has a
/// usable method.
async fn update(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
    Json(payload): Json<UpdatePayload>,
) -> AppResult<impl IntoResponse> {
    let facts = common::request_facts(&headers, &cookies)
        .with_param("phoneNumber", payload.phone_number.clone());

    let ctx = ValidationChain::new()
        .with(EmailVerifiedCheck::new(app_state.identity.clone()))
        .with(ConditionalSecondFactorCheck::new(
            app_state.capabilities.clone(),
            app_state.config.clone(),
        ))
        .run(&facts)
        .await?;
    let subject = ctx.require_subject()?;

    if let Some(number) = facts.param("phoneNumber") {
        app_state.accounts.change_phone(subject, number).await?;
    }

    Ok(Json(json!({ "success": true })))
}
