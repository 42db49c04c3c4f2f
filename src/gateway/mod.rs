//! Notification gateway: validate, normalize, fan out to FCM, report per-token results.

mod dispatcher;
mod payload;
mod request;

pub use dispatcher::{DeliveryOutcome, DeliveryResult, NotificationGateway};
pub use payload::{build_messages, normalize_data};
pub use request::{NotificationRequest, SendNotificationBody, ValidationError};
