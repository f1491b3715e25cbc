pub mod app_state_builder;
pub mod mocks;

pub use app_state_builder::{TestAppStateBuilder, test_config};
