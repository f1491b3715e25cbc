//! Opportunistic cleanup of expired exchange entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{info, warn};

use crate::use_cases::exchange::ExchangeUseCases;

pub async fn run_exchange_sweep_loop(exchange: Arc<ExchangeUseCases>, interval_secs: u64) {
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));

    info!(
        "Exchange sweeper started (sweeping every {}s)",
        interval_secs
    );

    loop {
        ticker.tick().await;

        match exchange.sweep().await {
            Ok(0) => {}
            Ok(purged) => info!(purged, "Swept expired handoffs"),
            Err(e) => warn!(error = ?e, "Exchange sweep failed"),
        }
    }
}
