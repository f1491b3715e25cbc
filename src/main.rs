use dotenvy::dotenv;
use std::net::SocketAddr;
use tracing::info;

use passgate::infra::{app::create_app, setup::init_app_state, sweeper::run_exchange_sweep_loop};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let app_state = init_app_state().await?;

    let bind_addr = app_state.config.bind_addr;

    let app = create_app(app_state.clone());

    // Opportunistic cleanup of expired handoffs (after tracing is initialized)
    let exchange = app_state.exchange.clone();
    let sweep_interval = app_state.config.sweep_interval_secs;
    tokio::spawn(async move {
        run_exchange_sweep_loop(exchange, sweep_interval).await;
    });

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Gateway listening at {}", &listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
