use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{
        http::app_state::AppState,
        persistence::PostgresPersistence,
        sms::{NoopSmsSender, http::HttpSmsSender},
    },
    infra::{
        config::AppConfig,
        db::init_db,
        exchange_memory::MemoryExchangeStore,
        exchange_redis::RedisExchangeStore,
        identity::HttpIdentityProvider,
        rate_limit::{MemoryRateLimiter, RateLimiterTrait, RedisRateLimiter},
    },
    use_cases::{
        account::{AccountStore, AccountUseCases, DeviceStore, SmsSender},
        capability::CapabilityUseCases,
        exchange::{ExchangeStore, ExchangeUseCases},
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let pool = init_db(&config.database_url).await?;
    let postgres = Arc::new(PostgresPersistence::new(pool));
    let devices = postgres.clone() as Arc<dyn DeviceStore>;
    let accounts = postgres.clone() as Arc<dyn AccountStore>;

    let (exchange_store, rate_limiter): (Arc<dyn ExchangeStore>, Arc<dyn RateLimiterTrait>) =
        match &config.redis_url {
            Some(redis_url) => (
                Arc::new(RedisExchangeStore::new(redis_url, config.exchange_ttl).await?),
                Arc::new(
                    RedisRateLimiter::new(
                        redis_url,
                        config.rate_limit_window_secs,
                        config.rate_limit_per_ip,
                    )
                    .await?,
                ),
            ),
            None => {
                tracing::warn!(
                    "REDIS_URL not set; using process-local exchange store and rate limiter"
                );
                (
                    Arc::new(MemoryExchangeStore::new(config.exchange_ttl)),
                    Arc::new(MemoryRateLimiter::new(
                        config.rate_limit_window_secs,
                        config.rate_limit_per_ip,
                    )),
                )
            }
        };

    let identity = Arc::new(HttpIdentityProvider::new(
        config.identity_provider_url.clone(),
    ));

    let sms: Arc<dyn SmsSender> = match &config.sms_api_url {
        Some(api_url) => Arc::new(HttpSmsSender::new(
            api_url.clone(),
            config.sms_api_key.clone(),
            config.sms_from.clone(),
        )),
        None => Arc::new(NoopSmsSender),
    };

    let capabilities = Arc::new(CapabilityUseCases::new(devices.clone(), accounts.clone()));
    let exchange = Arc::new(ExchangeUseCases::new(exchange_store, config.exchange_ttl));
    let accounts = Arc::new(AccountUseCases::new(
        accounts,
        devices,
        capabilities.clone(),
        sms,
    ));

    Ok(AppState {
        config: Arc::new(config),
        identity,
        capabilities,
        exchange,
        accounts,
        rate_limiter,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "passgate=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
