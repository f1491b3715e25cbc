use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use time::Duration;
use url::Url;

pub struct AppConfig {
    pub jwt_secret: SecretString,
    /// One knob drives both the signed `exp` and the cookie `Max-Age`, so
    /// the two lifetimes cannot drift apart.
    pub access_token_ttl: Duration,
    pub exchange_ttl: Duration,
    pub sweep_interval_secs: u64,
    pub identity_provider_url: Url,
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    pub database_url: String,
    /// When unset, the exchange store and rate limiter fall back to
    /// process-local backends (single-instance deployments only).
    pub redis_url: Option<String>,
    pub rate_limit_window_secs: u64,
    pub rate_limit_per_ip: u64,
    /// Whether to trust X-Forwarded-For headers. Set to true when behind a
    /// reverse proxy; never when the API is directly exposed.
    pub trust_proxy: bool,
    /// SMS challenge delivery endpoint; unset disables delivery.
    pub sms_api_url: Option<Url>,
    pub sms_api_key: SecretString,
    pub sms_from: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET").into());

        let access_token_ttl_secs: i64 = get_env_default("ACCESS_TOKEN_TTL_SECS", 600);
        let exchange_ttl_secs: i64 = get_env_default("EXCHANGE_TTL_SECS", 60);
        let sweep_interval_secs: u64 = get_env_default("SWEEP_INTERVAL_SECS", 30);

        let identity_provider_url: Url = get_env("IDENTITY_PROVIDER_URL");

        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");
        let redis_url: Option<String> = std::env::var("REDIS_URL").ok();

        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);
        let rate_limit_per_ip: u64 = get_env_default("RATE_LIMIT_PER_IP", 60);
        // Default to false for security - must explicitly enable when behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        let sms_api_url: Option<Url> = std::env::var("SMS_API_URL")
            .ok()
            .and_then(|s| s.parse().ok());
        let sms_api_key: SecretString =
            SecretString::new(get_env_default("SMS_API_KEY", String::new()).into());
        let sms_from: String = get_env_default("SMS_FROM", "passgate".to_string());

        Self {
            jwt_secret,
            access_token_ttl: Duration::seconds(access_token_ttl_secs),
            exchange_ttl: Duration::seconds(exchange_ttl_secs),
            sweep_interval_secs,
            identity_provider_url,
            bind_addr,
            cors_origin,
            database_url,
            redis_url,
            rate_limit_window_secs,
            rate_limit_per_ip,
            trust_proxy,
            sms_api_url,
            sms_api_key,
            sms_from,
        }
    }
}
