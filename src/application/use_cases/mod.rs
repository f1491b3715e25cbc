pub mod account;
pub mod capability;
pub mod exchange;
