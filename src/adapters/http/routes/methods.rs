//! Second-factor method listing.

use axum::{
    Json, Router, extract::State, http::HeaderMap, response::IntoResponse, routing::get,
};
use axum_extra::extract::CookieJar;

use crate::{
    adapters::http::{app_state::AppState, routes::common},
    app_error::AppResult,
    application::validation::{IdentityCheck, ValidationChain},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/methods", get(list))
}

/// The capability set is recomputed on every request; registering or
/// removing a device changes the answer immediately.
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

    let set = app_state.capabilities.for_subject(subject).await?;
    Ok(Json(set))
}
