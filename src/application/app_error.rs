use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Malformed authorization header")]
    MissingBearer,

    #[error("Identity token rejected")]
    InvalidIdentityToken,

    #[error("Device already registered")]
    DeviceExists,

    #[error("Phone number not verified")]
    PhoneNumberNotVerified,

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid access token")]
    InvalidAccessToken,

    #[error("Handoff hash not found")]
    HashNotFound,

    #[error("Handoff hash expired")]
    HashExpired,

    #[error("Too many requests. Please slow down.")]
    RateLimited,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable wire code. Clients key off these strings; never rename them.
    pub fn code(&self) -> String {
        match self {
            Self::MissingHeader => "MissingHeader".into(),
            Self::MissingBearer => "MissingBearer".into(),
            Self::InvalidIdentityToken => "InvalidIdentityToken".into(),
            Self::DeviceExists => "DeviceExists".into(),
            Self::PhoneNumberNotVerified => "PhoneNumberNotVerified".into(),
            Self::MissingParameter(field) => format!("MissingParameter:{field}"),
            Self::InvalidAccessToken => "InvalidAccessToken".into(),
            Self::HashNotFound => "HashNotFound".into(),
            Self::HashExpired => "HashExpired".into(),
            Self::RateLimited => "RateLimited".into(),
            // Detail stays in the server logs.
            Self::Database(_) | Self::Internal(_) => "Internal".into(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
