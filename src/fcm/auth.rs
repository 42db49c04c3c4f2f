//! OAuth2 access tokens for the FCM HTTP v1 API.
//!
//! Tokens are minted by exchanging a self-signed RS256 JWT assertion at the
//! credential's token endpoint and cached until shortly before they expire.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::credentials::ServiceAccountCredential;
use super::error::FcmError;

pub const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the reported expiry
const EXPIRY_MARGIN_SECS: i64 = 300;

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > now
    }
}

/// Mints and caches access tokens for one service account
pub struct AccessTokenProvider {
    credential: ServiceAccountCredential,
    token_uri: String,
    http_client: reqwest::Client,
    cache: Mutex<Option<CachedToken>>,
}

impl AccessTokenProvider {
    pub fn new(
        credential: ServiceAccountCredential,
        token_uri: Option<String>,
        http_client: reqwest::Client,
    ) -> Self {
        let token_uri = token_uri.unwrap_or_else(|| credential.token_uri().to_string());
        Self {
            credential,
            token_uri,
            http_client,
            cache: Mutex::new(None),
        }
    }

    pub fn credential(&self) -> &ServiceAccountCredential {
        &self.credential
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    /// Return a cached token or fetch a new one.
    ///
    /// The cache lock is held across the refresh so concurrent callers share a
    /// single exchange.
    pub async fn access_token(&self) -> Result<String, FcmError> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.access_token.clone());
            }
        }

        let fetched = self.fetch_token().await?;
        tracing::debug!(
            client_email = %self.credential.client_email(),
            expires_at = %fetched.expires_at,
            "Fetched FCM access token"
        );

        let access_token = fetched.access_token.clone();
        *cache = Some(fetched);
        Ok(access_token)
    }

    fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, FcmError> {
        let claims = AssertionClaims {
            iss: self.credential.client_email(),
            scope: FCM_SCOPE,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.credential.private_key_id().map(str::to_string);

        encode(&header, &claims, self.credential.encoding_key())
            .map_err(|e| FcmError::InvalidCredential(format!("failed to sign JWT assertion: {}", e)))
    }

    async fn fetch_token(&self) -> Result<CachedToken, FcmError> {
        let now = Utc::now();
        let assertion = self.sign_assertion(now)?;

        let params = [("grant_type", JWT_GRANT_TYPE), ("assertion", assertion.as_str())];

        let response = self
            .http_client
            .post(&self.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| FcmError::Network(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => format!("token endpoint responded with status {}", status.as_u16()),
            };
            return Err(FcmError::AccessToken(detail));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| FcmError::AccessToken(format!("invalid token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(FcmError::AccessToken(
                "token response did not contain an access token".to_string(),
            ));
        }

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: expiry_after(now, token.expires_in)?,
        })
    }
}

fn expiry_after(now: DateTime<Utc>, expires_in: i64) -> Result<DateTime<Utc>, FcmError> {
    Duration::try_seconds(expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            FcmError::AccessToken(format!("token expires_in out of range: {}", expires_in))
        })
}
