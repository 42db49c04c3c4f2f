use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fcm: FcmConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body size in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FcmConfig {
    /// Path to the Firebase service account JSON document
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    /// Base URL of the FCM HTTP v1 API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Overrides the OAuth2 token endpoint from the credential document
    #[serde(default)]
    pub token_uri: Option<String>,
    /// Maximum in-flight per-message requests within one batch
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    2051
}

fn default_body_limit() -> usize {
    100 * 1024 // 100 KiB
}

fn default_credentials_path() -> String {
    "firebase-service-account.json".to_string()
}

fn default_api_base_url() -> String {
    "https://fcm.googleapis.com/v1".to_string()
}

fn default_max_concurrency() -> usize {
    50
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "fcm-push-gateway".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", 2051)?
            .set_default("fcm.credentials_path", default_credentials_path())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SERVER__PORT, FCM__API_BASE_URL, OTEL__ENABLED, LOG__FORMAT, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            )
            .set_override_option("fcm.credentials_path", credentials_path_from_env())?;

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// `FCM_CREDENTIALS_PATH` wins over the Google SDK convention `GOOGLE_APPLICATION_CREDENTIALS`.
fn credentials_path_from_env() -> Option<String> {
    env::var("FCM_CREDENTIALS_PATH")
        .or_else(|_| env::var("GOOGLE_APPLICATION_CREDENTIALS"))
        .ok()
        .filter(|path| !path.trim().is_empty())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            cors_origins: vec![],
        }
    }
}

impl Default for FcmConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            api_base_url: default_api_base_url(),
            token_uri: None,
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}
