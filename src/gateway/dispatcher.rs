use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::fcm::{BatchResponse, FcmError, Messenger, SendResponse};
use crate::metrics::PushMetrics;

use super::payload::build_messages;
use super::request::NotificationRequest;

/// Per-token outcome, index-aligned with the submitted tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<SendResponse> for DeliveryOutcome {
    fn from(response: SendResponse) -> Self {
        let success = response.success();
        let (error, code) = match response.error {
            Some(err) => (Some(err.message), Some(err.code)),
            None => (None, None),
        };
        Self {
            success,
            message_id: response.message_id,
            error,
            code,
        }
    }
}

/// Result of one gateway send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub success_count: usize,
    pub failure_count: usize,
    pub responses: Vec<DeliveryOutcome>,
}

impl From<BatchResponse> for DeliveryResult {
    fn from(batch: BatchResponse) -> Self {
        Self {
            success_count: batch.success_count,
            failure_count: batch.failure_count,
            responses: batch.responses.into_iter().map(DeliveryOutcome::from).collect(),
        }
    }
}

/// Turns validated requests into one provider batch-send
pub struct NotificationGateway {
    messenger: Arc<dyn Messenger>,
}

impl NotificationGateway {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }

    /// Build one message per token and submit them in a single batch.
    ///
    /// Per-token failures are data in the returned result; only errors raised
    /// by the provider call itself are returned as `Err`.
    #[tracing::instrument(
        name = "gateway.send_notifications",
        skip(self, request),
        fields(recipients = request.tokens.len())
    )]
    pub async fn send_notifications(
        &self,
        request: NotificationRequest,
    ) -> Result<DeliveryResult, FcmError> {
        let messages = build_messages(&request);
        let recipients = messages.len();

        if request.discarded > 0 {
            tracing::debug!(discarded = request.discarded, "Dropped invalid tokens");
        }
        tracing::info!("Sending notifications to {} devices...", recipients);

        let started = Instant::now();
        let batch = self.messenger.send_each(messages).await;
        PushMetrics::observe_upstream_latency(started.elapsed());

        let batch = batch.inspect_err(|e| {
            tracing::error!(code = %e.code(), error = %e, "FCM batch send failed");
        })?;

        tracing::info!(
            success = batch.success_count,
            failed = batch.failure_count,
            "Notification send complete"
        );

        for (index, response) in batch.responses.iter().enumerate() {
            if let Some(err) = &response.error {
                tracing::warn!(
                    index = index,
                    code = %err.code,
                    "Failed to send to token {}: {}",
                    index,
                    err.message
                );
            }
        }

        PushMetrics::record_batch(batch.success_count as u64, batch.failure_count as u64);

        Ok(batch.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fcm::{Message, SendError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Succeeds for every token except those starting with "bad"
    #[derive(Default)]
    struct RecordingMessenger {
        batches: Mutex<Vec<Vec<Message>>>,
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send_each(&self, messages: Vec<Message>) -> Result<BatchResponse, FcmError> {
            let responses = messages
                .iter()
                .map(|m| {
                    if m.token.starts_with("bad") {
                        SendResponse::failed(SendError::new(
                            "messaging/registration-token-not-registered",
                            "Requested entity was not found.",
                        ))
                    } else {
                        SendResponse::delivered(format!("projects/p/messages/{}", m.token))
                    }
                })
                .collect();
            self.batches.lock().unwrap().push(messages);
            Ok(BatchResponse::new(responses))
        }
    }

    struct FailingMessenger;

    #[async_trait]
    impl Messenger for FailingMessenger {
        async fn send_each(&self, _messages: Vec<Message>) -> Result<BatchResponse, FcmError> {
            Err(FcmError::AccessToken("invalid_grant: Invalid JWT Signature.".into()))
        }
    }

    fn request(tokens: &[&str]) -> NotificationRequest {
        NotificationRequest {
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            title: "A".into(),
            body: "B".into(),
            data: None,
            discarded: 0,
        }
    }

    #[tokio::test]
    async fn test_outcomes_align_with_tokens() {
        let messenger = Arc::new(RecordingMessenger::default());
        let gateway = NotificationGateway::new(messenger.clone());

        let result = gateway
            .send_notifications(request(&["t1", "bad2", "t3"]))
            .await
            .unwrap();

        assert_eq!(result.success_count, 2);
        assert_eq!(result.failure_count, 1);
        assert!(result.responses[0].success);
        assert!(!result.responses[1].success);
        assert_eq!(
            result.responses[1].code.as_deref(),
            Some("messaging/registration-token-not-registered")
        );
        assert_eq!(
            result.responses[2].message_id.as_deref(),
            Some("projects/p/messages/t3")
        );

        let batches = messenger.batches.lock().unwrap();
        assert_eq!(batches.len(), 1, "all tokens go out in one batch");
        assert_eq!(batches[0].len(), 3);
    }

    #[tokio::test]
    async fn test_repeated_requests_are_not_deduplicated() {
        let messenger = Arc::new(RecordingMessenger::default());
        let gateway = NotificationGateway::new(messenger.clone());

        gateway.send_notifications(request(&["t1"])).await.unwrap();
        gateway.send_notifications(request(&["t1"])).await.unwrap();

        assert_eq!(messenger.batches.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_upstream_error_propagates() {
        let gateway = NotificationGateway::new(Arc::new(FailingMessenger));

        let err = gateway.send_notifications(request(&["t1"])).await.unwrap_err();
        assert_eq!(err.code(), "app/invalid-credential");
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[test]
    fn test_outcome_serialization() {
        let ok = DeliveryOutcome::from(SendResponse::delivered("projects/p/messages/1"));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"success": true, "messageId": "projects/p/messages/1"})
        );

        let failed = DeliveryOutcome::from(SendResponse::failed(SendError::new(
            "messaging/invalid-argument",
            "bad token",
        )));
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            serde_json::json!({
                "success": false,
                "error": "bad token",
                "code": "messaging/invalid-argument"
            })
        );
    }
}
