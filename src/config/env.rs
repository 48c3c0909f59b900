use std::{path::PathBuf, time::Duration};

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub groq: GroqConfig,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryConfig,
    pub moderation: ModerationConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: Url,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests_per_window: usize,
    pub window: Duration,
    pub min_spacing: Duration,
    pub safety_margin: Duration,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub rate_limit_wait: Duration,
}

#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Whether results carry a `confidence_score`.
    pub confidence_score: bool,
    pub prompt_template_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub results_dir: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
