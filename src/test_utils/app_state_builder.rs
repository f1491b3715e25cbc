//! Test app state builder for HTTP-level route testing.
//!
//! Creates an `AppState` backed entirely by in-memory mocks; the builder's
//! Arc handles stay usable after `build()` for seeding and assertions.

use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use time::Duration;

use crate::{
    adapters::http::app_state::AppState,
    infra::{config::AppConfig, exchange_memory::MemoryExchangeStore},
    test_utils::mocks::{
        CapturingSmsSender, InMemoryAccountStore, InMemoryDeviceStore, StubIdentityProvider,
        StubRateLimiter,
    },
    use_cases::{
        account::{AccountUseCases, DeviceKind},
        capability::CapabilityUseCases,
        exchange::ExchangeUseCases,
    },
};

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: SecretString::new("test_jwt_secret".into()),
        access_token_ttl: Duration::seconds(600),
        exchange_ttl: Duration::seconds(60),
        sweep_interval_secs: 30,
        identity_provider_url: "http://identity.test/verify".parse().unwrap(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        database_url: "postgres://unused".to_string(),
        redis_url: None,
        rate_limit_window_secs: 60,
        rate_limit_per_ip: 1000,
        trust_proxy: false,
        sms_api_url: None,
        sms_api_key: SecretString::new("".into()),
        sms_from: "passgate".to_string(),
    }
}

pub struct TestAppStateBuilder {
    pub identity: Arc<StubIdentityProvider>,
    pub devices: Arc<InMemoryDeviceStore>,
    pub accounts: Arc<InMemoryAccountStore>,
    pub sms: Arc<CapturingSmsSender>,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            identity: Arc::new(StubIdentityProvider::new()),
            devices: Arc::new(InMemoryDeviceStore::new()),
            accounts: Arc::new(InMemoryAccountStore::new()),
            sms: Arc::new(CapturingSmsSender::new()),
        }
    }

    /// Accept `token` as a first-factor credential for `subject`.
    pub fn with_identity_token(self, token: &str, subject: &str, email_verified: bool) -> Self {
        self.identity.allow(token, subject, email_verified);
        self
    }

    pub fn with_account(self, subject: &str, phone_number: Option<&str>, verified: bool) -> Self {
        self.accounts.put(subject, phone_number, verified);
        self
    }

    pub fn with_device(self, subject: &str, device_id: &str, kind: DeviceKind) -> Self {
        self.devices.put(subject, device_id, kind);
        self
    }

    pub fn build(&self) -> AppState {
        let config = Arc::new(test_config());
        let capabilities = Arc::new(CapabilityUseCases::new(
            self.devices.clone(),
            self.accounts.clone(),
        ));
        let exchange_store = Arc::new(MemoryExchangeStore::new(config.exchange_ttl));
        let exchange = Arc::new(ExchangeUseCases::new(exchange_store, config.exchange_ttl));
        let accounts = Arc::new(AccountUseCases::new(
            self.accounts.clone(),
            self.devices.clone(),
            capabilities.clone(),
            self.sms.clone(),
        ));

        AppState {
            config,
            identity: self.identity.clone(),
            capabilities,
            exchange,
            accounts,
            rate_limiter: Arc::new(StubRateLimiter),
        }
    }
}
