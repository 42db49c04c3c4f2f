//! API layer - HTTP endpoint handlers.

mod health;
mod metrics;
mod routes;
mod send;

pub use health::{health, HealthResponse, SERVICE_NAME};
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
pub use send::{send_notifications, SendNotificationResponse};
