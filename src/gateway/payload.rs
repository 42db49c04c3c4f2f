//! Building FCM messages from a validated request.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::fcm::{
    AndroidConfig, AndroidNotification, AndroidPriority, Message, Notification, WebpushConfig,
    WebpushFcmOptions,
};

use super::request::NotificationRequest;

const DEFAULT_SOUND: &str = "default";
const DEFAULT_LINK: &str = "/";
const CLICK_ACTION_KEY: &str = "click_action";

/// Coerce an arbitrary data payload into FCM's string-only form.
///
/// Strings pass through untouched; every other value becomes its JSON text.
pub fn normalize_data(data: Option<&Map<String, Value>>) -> BTreeMap<String, String> {
    data.map(|map| {
        map.iter()
            .map(|(key, value)| (key.clone(), stringify_value(value)))
            .collect()
    })
    .unwrap_or_default()
}

fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => integral_floats_as_ints(other).to_string(),
    }
}

/// Largest magnitude at which every integer is exactly representable as `f64`
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Rewrite whole-number floats as integers, so `1.0` and `1e3` render as `1` and `1000`.
fn integral_floats_as_ints(value: &Value) -> Value {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
                Value::from(f as i64)
            }
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(integral_floats_as_ints).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), integral_floats_as_ints(item)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Web-push click target: `data.click_action` when set, otherwise `/`
fn click_link(data: &BTreeMap<String, String>) -> String {
    data.get(CLICK_ACTION_KEY)
        .filter(|link| !link.is_empty())
        .cloned()
        .unwrap_or_else(|| DEFAULT_LINK.to_string())
}

/// Build one message per token, in token order.
pub fn build_messages(request: &NotificationRequest) -> Vec<Message> {
    let data = normalize_data(request.data.as_ref());
    let link = click_link(&data);

    let notification = Notification {
        title: request.title.clone(),
        body: request.body.clone(),
    };

    request
        .tokens
        .iter()
        .map(|token| Message {
            token: token.clone(),
            notification: notification.clone(),
            data: data.clone(),
            android: Some(AndroidConfig {
                priority: AndroidPriority::High,
                notification: Some(AndroidNotification {
                    sound: Some(DEFAULT_SOUND.to_string()),
                }),
            }),
            webpush: Some(WebpushConfig {
                notification: Some(notification.clone()),
                fcm_options: Some(WebpushFcmOptions { link: link.clone() }),
            }),
        })
        .collect()
}
