//! Health check endpoint.

use axum::Json;
use serde::Serialize;

pub const SERVICE_NAME: &str = "FCM Push Notification Service";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
    })
}
