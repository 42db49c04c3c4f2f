//! FCM HTTP v1 message payloads and batch results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::SendError;

/// One message addressed to a single registration token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub token: String,
    pub notification: Notification,
    /// FCM only accepts string values in the data payload
    pub data: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webpush: Option<WebpushConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AndroidPriority {
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AndroidConfig {
    pub priority: AndroidPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<AndroidNotification>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AndroidNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebpushConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcm_options: Option<WebpushFcmOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebpushFcmOptions {
    pub link: String,
}

/// Request envelope for `projects/{project}/messages:send`
#[derive(Debug, Serialize)]
pub(crate) struct SendRequest<'a> {
    pub message: &'a Message,
}

/// Successful `messages:send` reply
#[derive(Debug, Deserialize)]
pub(crate) struct SendReply {
    pub name: String,
}

/// Outcome of one message inside a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResponse {
    pub message_id: Option<String>,
    pub error: Option<SendError>,
}

impl SendResponse {
    pub fn delivered(message_id: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    pub fn failed(error: SendError) -> Self {
        Self {
            message_id: None,
            error: Some(error),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregated result of `send_each`, one response per submitted message in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResponse {
    pub responses: Vec<SendResponse>,
    pub success_count: usize,
    pub failure_count: usize,
}

impl BatchResponse {
    pub fn new(responses: Vec<SendResponse>) -> Self {
        let success_count = responses.iter().filter(|r| r.success()).count();
        let failure_count = responses.len() - success_count;
        Self {
            responses,
            success_count,
            failure_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_wire_format() {
        let message = Message {
            token: "abc".into(),
            notification: Notification {
                title: "Hi".into(),
                body: "there".into(),
            },
            data: BTreeMap::from([("k".to_string(), "v".to_string())]),
            android: Some(AndroidConfig {
                priority: AndroidPriority::High,
                notification: Some(AndroidNotification {
                    sound: Some("default".into()),
                }),
            }),
            webpush: Some(WebpushConfig {
                notification: None,
                fcm_options: Some(WebpushFcmOptions { link: "/".into() }),
            }),
        };

        let value = serde_json::to_value(SendRequest { message: &message }).unwrap();
        assert_eq!(
            value,
            json!({
                "message": {
                    "token": "abc",
                    "notification": { "title": "Hi", "body": "there" },
                    "data": { "k": "v" },
                    "android": { "priority": "high", "notification": { "sound": "default" } },
                    "webpush": { "fcmOptions": { "link": "/" } }
                }
            })
        );
    }

    #[test]
    fn test_batch_counts() {
        let batch = BatchResponse::new(vec![
            SendResponse::delivered("projects/p/messages/1"),
            SendResponse::failed(SendError::new("messaging/invalid-argument", "bad token")),
            SendResponse::delivered("projects/p/messages/2"),
        ]);

        assert_eq!(batch.success_count, 2);
        assert_eq!(batch.failure_count, 1);
        assert!(!batch.responses[1].success());
    }
}
