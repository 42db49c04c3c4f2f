//! Firebase Cloud Messaging client.
//!
//! - `credentials`: service account loading and validation
//! - `auth`: OAuth2 access tokens minted from the service account
//! - `message`: HTTP v1 message payloads and batch results
//! - `client`: the `Messenger` batch-send seam and its FCM implementation

pub mod auth;
mod client;
pub mod credentials;
pub mod error;
pub mod message;

pub use client::{FcmClient, Messenger, MAX_BATCH_SIZE};
pub use credentials::{ServiceAccountCredential, ServiceAccountKey};
pub use error::{codes, FcmError, SendError};
pub use message::{
    AndroidConfig, AndroidNotification, AndroidPriority, BatchResponse, Message, Notification,
    SendResponse, WebpushConfig, WebpushFcmOptions,
};
