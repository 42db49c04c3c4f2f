//! FCM error types and the classification of FCM v1 error responses.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification codes shared with the Firebase Admin SDKs.
pub mod codes {
    pub const INVALID_CREDENTIAL: &str = "app/invalid-credential";
    pub const NETWORK_ERROR: &str = "app/network-error";
    pub const INVALID_ARGUMENT: &str = "messaging/invalid-argument";
    pub const TOKEN_NOT_REGISTERED: &str = "messaging/registration-token-not-registered";
    pub const MISMATCHED_CREDENTIAL: &str = "messaging/mismatched-credential";
    pub const MESSAGE_RATE_EXCEEDED: &str = "messaging/message-rate-exceeded";
    pub const SERVER_UNAVAILABLE: &str = "messaging/server-unavailable";
    pub const INTERNAL_ERROR: &str = "messaging/internal-error";
    pub const THIRD_PARTY_AUTH_ERROR: &str = "messaging/third-party-auth-error";
    pub const AUTHENTICATION_ERROR: &str = "messaging/authentication-error";
    pub const UNKNOWN_ERROR: &str = "messaging/unknown-error";
}

/// Errors that fail an FCM call as a whole.
#[derive(Error, Debug)]
pub enum FcmError {
    #[error("Failed to read service account credential from {path}: {reason}")]
    CredentialLoad { path: String, reason: String },

    #[error("Invalid service account credential: {0}")]
    InvalidCredential(String),

    #[error("Failed to fetch a valid Google OAuth2 access token: {0}")]
    AccessToken(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("{0}")]
    InvalidArgument(String),
}

impl FcmError {
    /// Classification code reported to API callers
    pub fn code(&self) -> &'static str {
        match self {
            FcmError::CredentialLoad { .. }
            | FcmError::InvalidCredential(_)
            | FcmError::AccessToken(_) => codes::INVALID_CREDENTIAL,
            FcmError::Network(_) => codes::NETWORK_ERROR,
            FcmError::InvalidArgument(_) => codes::INVALID_ARGUMENT,
        }
    }
}

/// Failure of a single message inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendError {
    pub code: String,
    pub message: String,
}

impl SendError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Transport-level failure (connect, TLS, body read)
    pub fn network(err: &reqwest::Error) -> Self {
        Self::new(codes::NETWORK_ERROR, err.to_string())
    }

    /// Build from a non-2xx FCM response.
    ///
    /// The FCM-specific `errorCode` in `error.details` wins over the generic
    /// `error.status`; the HTTP status is the last resort.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();

        let fcm_code = parsed.as_ref().and_then(|b| {
            b.error
                .details
                .iter()
                .find(|d| d.kind.as_deref().is_some_and(|t| t.ends_with(FCM_ERROR_TYPE)))
                .and_then(|d| d.error_code.clone())
        });
        let api_status = parsed.as_ref().and_then(|b| b.error.status.clone());

        let code = fcm_code
            .as_deref()
            .or(api_status.as_deref())
            .map(code_for_fcm_error)
            .unwrap_or_else(|| code_for_http_status(status));

        let message = parsed
            .and_then(|b| b.error.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Server responded with status {}.", status.as_u16()));

        Self::new(code, message)
    }
}

const FCM_ERROR_TYPE: &str = "google.firebase.fcm.v1.FcmError";

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
}

fn code_for_fcm_error(error_code: &str) -> &'static str {
    match error_code {
        "UNREGISTERED" | "NOT_FOUND" => codes::TOKEN_NOT_REGISTERED,
        "INVALID_ARGUMENT" => codes::INVALID_ARGUMENT,
        "SENDER_ID_MISMATCH" => codes::MISMATCHED_CREDENTIAL,
        "QUOTA_EXCEEDED" | "RESOURCE_EXHAUSTED" => codes::MESSAGE_RATE_EXCEEDED,
        "UNAVAILABLE" => codes::SERVER_UNAVAILABLE,
        "INTERNAL" => codes::INTERNAL_ERROR,
        "THIRD_PARTY_AUTH_ERROR" | "APNS_AUTH_ERROR" => codes::THIRD_PARTY_AUTH_ERROR,
        "UNAUTHENTICATED" | "PERMISSION_DENIED" => codes::AUTHENTICATION_ERROR,
        _ => codes::UNKNOWN_ERROR,
    }
}

fn code_for_http_status(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => codes::INVALID_ARGUMENT,
        401 | 403 => codes::AUTHENTICATION_ERROR,
        404 => codes::TOKEN_NOT_REGISTERED,
        429 => codes::MESSAGE_RATE_EXCEEDED,
        500 => codes::INTERNAL_ERROR,
        503 => codes::SERVER_UNAVAILABLE,
        _ => codes::UNKNOWN_ERROR,
    }
}
