use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::fcm::FcmError;
use crate::gateway::ValidationError;

/// Classification reported when an error carries none of its own
const UNKNOWN_CODE: &str = "unknown";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Upstream(#[from] FcmError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Every error response is a single flat JSON object
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::Validation(message) | AppError::PayloadTooLarge(message) => {
                // Client mistakes are not failures of the service
                tracing::debug!(status = %status.as_u16(), message = %message, "Rejected request");
                ErrorResponse {
                    error: message,
                    code: None,
                }
            }
            AppError::Upstream(err) => {
                let code = err.code();
                let message = err.to_string();
                tracing::error!(
                    code = %code,
                    status = %status.as_u16(),
                    message = %message,
                    "FCM error"
                );
                ErrorResponse {
                    error: message,
                    code: Some(code.to_string()),
                }
            }
            AppError::Internal(message) => {
                tracing::error!(status = %status.as_u16(), message = %message, "Internal error");
                let client_message = if is_production() {
                    "Internal server error".to_string()
                } else {
                    message
                };
                ErrorResponse {
                    error: client_message,
                    code: Some(UNKNOWN_CODE.to_string()),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
