pub mod app;
pub mod config;
pub mod db;
pub mod exchange_memory;
pub mod exchange_redis;
pub mod http_client;
pub mod identity;
pub mod rate_limit;
pub mod setup;
pub mod sweeper;
