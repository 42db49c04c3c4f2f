//! Request models for the send endpoint and their validation.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Raw `/send` body.
///
/// Every field is loosely typed so that shape errors surface as the same
/// validation messages as missing fields.
#[derive(Debug, Default, Deserialize)]
pub struct SendNotificationBody {
    #[serde(default)]
    pub tokens: Option<Value>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("tokens array required")]
    TokensRequired,
    #[error("title and body are required")]
    ContentRequired,
    #[error("No valid tokens provided")]
    NoValidTokens,
}

/// A validated notification request
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRequest {
    /// Surviving tokens in their original order
    pub tokens: Vec<String>,
    pub title: String,
    pub body: String,
    pub data: Option<Map<String, Value>>,
    /// Number of submitted entries dropped by token filtering
    pub discarded: usize,
}

impl TryFrom<SendNotificationBody> for NotificationRequest {
    type Error = ValidationError;

    fn try_from(raw: SendNotificationBody) -> Result<Self, Self::Error> {
        let entries = match raw.tokens {
            Some(Value::Array(entries)) if !entries.is_empty() => entries,
            _ => return Err(ValidationError::TokensRequired),
        };

        let (title, body) = match (non_empty_string(raw.title), non_empty_string(raw.body)) {
            (Some(title), Some(body)) => (title, body),
            _ => return Err(ValidationError::ContentRequired),
        };

        let submitted = entries.len();
        let tokens: Vec<String> = entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(token) if !token.trim().is_empty() => Some(token),
                _ => None,
            })
            .collect();

        if tokens.is_empty() {
            return Err(ValidationError::NoValidTokens);
        }

        let data = match raw.data {
            Some(Value::Object(map)) => Some(map),
            // Arrays become index-keyed entries
            Some(Value::Array(items)) => Some(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| (index.to_string(), item))
                    .collect(),
            ),
            _ => None,
        };

        Ok(Self {
            discarded: submitted - tokens.len(),
            tokens,
            title,
            body,
            data,
        })
    }
}

fn non_empty_string(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}
