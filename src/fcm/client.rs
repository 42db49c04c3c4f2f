use std::time::Instant;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::config::FcmConfig;

use super::auth::AccessTokenProvider;
use super::credentials::ServiceAccountCredential;
use super::error::{FcmError, SendError};
use super::message::{BatchResponse, Message, SendReply, SendRequest, SendResponse};

/// Upper bound on messages accepted by a single `send_each` call
pub const MAX_BATCH_SIZE: usize = 500;

/// Batch-send capability of the push provider.
///
/// Implementations must return exactly one response per message, in the order
/// the messages were submitted.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_each(&self, messages: Vec<Message>) -> Result<BatchResponse, FcmError>;
}

/// Firebase Cloud Messaging client backed by the HTTP v1 API
pub struct FcmClient {
    send_url: String,
    tokens: AccessTokenProvider,
    http_client: reqwest::Client,
    max_concurrency: usize,
}

impl FcmClient {
    /// Load the service account named by `config` and build a client for it.
    pub fn from_config(config: &FcmConfig) -> Result<Self, FcmError> {
        let credential = ServiceAccountCredential::from_file(&config.credentials_path)?;
        Self::new(credential, config)
    }

    pub fn new(credential: ServiceAccountCredential, config: &FcmConfig) -> Result<Self, FcmError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FcmError::Network(format!("failed to build HTTP client: {}", e)))?;

        let send_url = format!(
            "{}/projects/{}/messages:send",
            config.api_base_url.trim_end_matches('/'),
            credential.project_id()
        );

        tracing::info!(
            project_id = %credential.project_id(),
            client_email = %credential.client_email(),
            "FCM client initialized"
        );

        let tokens = AccessTokenProvider::new(credential, config.token_uri.clone(), http_client.clone());

        Ok(Self {
            send_url,
            tokens,
            http_client,
            max_concurrency: config.max_concurrency.max(1),
        })
    }

    pub fn project_id(&self) -> &str {
        self.tokens.credential().project_id()
    }

    pub fn send_url(&self) -> &str {
        &self.send_url
    }

    /// Send one message. Failures are reported in the response, never raised.
    async fn send_one(&self, message: &Message, access_token: &str) -> SendResponse {
        let result = self
            .http_client
            .post(&self.send_url)
            .bearer_auth(access_token)
            .json(&SendRequest { message })
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => return SendResponse::failed(SendError::network(&e)),
        };

        let status = response.status();
        if status.is_success() {
            match response.json::<SendReply>().await {
                Ok(reply) => SendResponse::delivered(reply.name),
                Err(e) => SendResponse::failed(SendError::network(&e)),
            }
        } else {
            let body = response.text().await.unwrap_or_default();
            SendResponse::failed(SendError::from_response(status, &body))
        }
    }
}

#[async_trait]
impl Messenger for FcmClient {
    async fn send_each(&self, messages: Vec<Message>) -> Result<BatchResponse, FcmError> {
        if messages.is_empty() {
            return Err(FcmError::InvalidArgument(
                "messages must be a non-empty array".to_string(),
            ));
        }
        if messages.len() > MAX_BATCH_SIZE {
            return Err(FcmError::InvalidArgument(format!(
                "messages list must not contain more than {} items",
                MAX_BATCH_SIZE
            )));
        }

        let access_token = self.tokens.access_token().await?;
        let started = Instant::now();

        let sends: Vec<_> = messages
            .iter()
            .map(|message| self.send_one(message, &access_token))
            .collect();

        // `buffered` keeps results in submission order
        let responses: Vec<SendResponse> = stream::iter(sends)
            .buffered(self.max_concurrency)
            .collect()
            .await;

        tracing::debug!(
            count = messages.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "FCM batch completed"
        );

        Ok(BatchResponse::new(responses))
    }
}
