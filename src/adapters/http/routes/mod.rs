pub mod account;
pub mod auth;
pub mod common;
pub mod devices;
pub mod exchange;
pub mod methods;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router().merge(methods::router()))
        .nest("/devices", devices::router())
        .nest("/account", account::router())
        .nest("/exchange", exchange::router())
}
