mod settings;

pub use settings::{FcmConfig, LogConfig, LogFormat, OtelConfig, ServerConfig, Settings};
