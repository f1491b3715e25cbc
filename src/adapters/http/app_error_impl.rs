use crate::app_error::AppError;
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        // Stable contract: clients dispatch on these statuses and the code
        // strings in the body. Unlisted codes fall in the 400 bucket.
        let status = match &self {
            AppError::MissingHeader | AppError::MissingBearer => StatusCode::FORBIDDEN,
            AppError::InvalidIdentityToken => StatusCode::BAD_REQUEST,
            AppError::DeviceExists => StatusCode::UNAUTHORIZED,
            AppError::PhoneNumberNotVerified => StatusCode::CONFLICT,
            AppError::MissingParameter(_) => StatusCode::PRECONDITION_FAILED,
            AppError::InvalidAccessToken => StatusCode::EXPECTATION_FAILED,
            AppError::HashNotFound | AppError::HashExpired => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(serde_json::json!({ "error": self.code() }))).into_response()
    }
}
