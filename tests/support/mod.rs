//! In-process fakes of the Google OAuth2 token endpoint and the FCM v1 send API.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Form, Json, Router,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use fcm_push_gateway::config::FcmConfig;
use fcm_push_gateway::fcm::{FcmClient, ServiceAccountCredential};

pub const SERVICE_ACCOUNT: &str = include_str!("../fixtures/service-account.json");
pub const PUBLIC_KEY: &str = include_str!("../fixtures/service-account.pub.pem");
pub const ACCESS_TOKEN: &str = "ya29.test-access-token";

/// Token prefixes that steer the fake FCM endpoint
pub const UNREGISTERED_PREFIX: &str = "unregistered";
pub const MALFORMED_PREFIX: &str = "malformed";
pub const SLOW_PREFIX: &str = "slow";

#[derive(Debug, Deserialize)]
struct TokenForm {
    grant_type: String,
    assertion: String,
}

#[derive(Debug, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
}

pub struct FakeGoogle {
    pub base_url: String,
    pub token_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
    /// Request bodies received by the send endpoint, in arrival order
    pub sent: Mutex<Vec<Value>>,
    reject_assertions: bool,
}

impl FakeGoogle {
    pub fn token_uri(&self) -> String {
        format!("{}/token", self.base_url)
    }

    pub fn api_base_url(&self) -> String {
        format!("{}/v1", self.base_url)
    }

    pub fn fcm_config(&self) -> FcmConfig {
        FcmConfig {
            api_base_url: self.api_base_url(),
            token_uri: Some(self.token_uri()),
            max_concurrency: 4,
            ..FcmConfig::default()
        }
    }

    pub fn client(&self) -> FcmClient {
        let credential = ServiceAccountCredential::from_json(SERVICE_ACCOUNT).unwrap();
        FcmClient::new(credential, &self.fcm_config()).unwrap()
    }

    pub fn sent_tokens(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|body| body["message"]["token"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

/// Start a fake that issues access tokens and accepts sends.
pub async fn spawn_fake_google() -> Arc<FakeGoogle> {
    spawn(false).await
}

/// Start a fake whose token endpoint rejects every assertion.
pub async fn spawn_rejecting_fake_google() -> Arc<FakeGoogle> {
    spawn(true).await
}

async fn spawn(reject_assertions: bool) -> Arc<FakeGoogle> {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake google");
    let addr: SocketAddr = listener.local_addr().unwrap();

    let fake = Arc::new(FakeGoogle {
        base_url: format!("http://{}", addr),
        token_calls: AtomicUsize::new(0),
        send_calls: AtomicUsize::new(0),
        sent: Mutex::new(Vec::new()),
        reject_assertions,
    });

    let app = Router::new()
        .route("/token", post(issue_token))
        .route("/v1/projects/{project_id}/messages:send", post(send_message))
        .with_state(fake.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve fake google");
    });

    fake
}

async fn issue_token(
    State(fake): State<Arc<FakeGoogle>>,
    Form(form): Form<TokenForm>,
) -> (StatusCode, Json<Value>) {
    fake.token_calls.fetch_add(1, Ordering::SeqCst);

    if fake.reject_assertions {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Invalid JWT Signature."})),
        );
    }

    if form.grant_type != "urn:ietf:params:oauth:grant-type:jwt-bearer" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "unsupported_grant_type"})),
        );
    }

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[fake.token_uri()]);
    let key = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap();

    match decode::<AssertionClaims>(&form.assertion, &key, &validation) {
        Ok(data)
            if data.claims.iss == "push-gateway@demo-push-project.iam.gserviceaccount.com"
                && data.claims.scope == "https://www.googleapis.com/auth/firebase.messaging" =>
        {
            (
                StatusCode::OK,
                Json(json!({
                    "access_token": ACCESS_TOKEN,
                    "expires_in": 3599,
                    "token_type": "Bearer"
                })),
            )
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Invalid JWT Signature."})),
        ),
    }
}

async fn send_message(
    State(fake): State<Arc<FakeGoogle>>,
    Path(project_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", ACCESS_TOKEN));
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"code": 401, "message": "Request had invalid authentication credentials.", "status": "UNAUTHENTICATED"}})),
        );
    }

    let index = fake.send_calls.fetch_add(1, Ordering::SeqCst);
    let token = body["message"]["token"].as_str().unwrap_or_default().to_string();
    fake.sent.lock().unwrap().push(body);

    if token.starts_with(SLOW_PREFIX) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    if token.starts_with(UNREGISTERED_PREFIX) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": {
                    "code": 404,
                    "message": "Requested entity was not found.",
                    "status": "NOT_FOUND",
                    "details": [{
                        "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                        "errorCode": "UNREGISTERED"
                    }]
                }
            })),
        );
    }

    if token.starts_with(MALFORMED_PREFIX) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {
                    "code": 400,
                    "message": "The registration token is not a valid FCM registration token",
                    "status": "INVALID_ARGUMENT"
                }
            })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({"name": format!("projects/{}/messages/{}-{}", project_id, index, token)})),
    )
}
