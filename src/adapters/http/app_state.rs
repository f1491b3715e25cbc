use std::sync::Arc;

use crate::{
    application::validation::IdentityProvider,
    infra::{config::AppConfig, rate_limit::RateLimiterTrait},
    use_cases::{
        account::AccountUseCases, capability::CapabilityUseCases, exchange::ExchangeUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub identity: Arc<dyn IdentityProvider>,
    pub capabilities: Arc<CapabilityUseCases>,
    pub exchange: Arc<ExchangeUseCases>,
    pub accounts: Arc<AccountUseCases>,
    pub rate_limiter: Arc<dyn RateLimiterTrait>,
}
