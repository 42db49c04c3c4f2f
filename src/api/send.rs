//! `POST /send`: fan a notification out to a batch of device tokens.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::gateway::{DeliveryOutcome, DeliveryResult, NotificationRequest, SendNotificationBody};
use crate::metrics::{PushMetrics, RequestOutcome};
use crate::server::AppState;

/// Response for a completed batch, including partial failures
#[derive(Debug, Serialize)]
pub struct SendNotificationResponse {
    pub success: bool,
    /// Messages accepted by FCM
    pub sent: usize,
    /// Messages rejected by FCM
    pub failed: usize,
    /// One entry per valid token, in request order
    pub responses: Vec<DeliveryOutcome>,
}

impl From<DeliveryResult> for SendNotificationResponse {
    fn from(result: DeliveryResult) -> Self {
        Self {
            success: true,
            sent: result.success_count,
            failed: result.failure_count,
            responses: result.responses,
        }
    }
}

/// Malformed bodies are validation errors; only oversized bodies keep their own status
fn rejection_error(rejection: JsonRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(rejection.body_text())
    } else {
        AppError::Validation(rejection.body_text())
    }
}

pub async fn send_notifications(
    State(state): State<AppState>,
    body: std::result::Result<Json<SendNotificationBody>, JsonRejection>,
) -> Result<Json<SendNotificationResponse>> {
    let raw = match body {
        Ok(Json(raw)) => Ok(raw),
        // A body without a JSON content type is not parsed; validate it as empty
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(SendNotificationBody::default()),
        Err(rejection) => Err(rejection_error(rejection)),
    };

    let request = raw
        .and_then(|raw| NotificationRequest::try_from(raw).map_err(AppError::from))
        .inspect_err(|_| PushMetrics::record_request(RequestOutcome::ValidationError))?;

    let result = state
        .gateway
        .send_notifications(request)
        .await
        .inspect_err(|_| PushMetrics::record_request(RequestOutcome::UpstreamError))?;

    PushMetrics::record_request(RequestOutcome::Ok);
    Ok(Json(result.into()))
}
