pub mod app_error;
pub mod jwt;
pub mod use_cases;
pub mod validation;
