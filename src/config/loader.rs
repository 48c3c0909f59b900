use std::{env, path::PathBuf, str::FromStr, time::Duration};

use url::Url;

use super::env::{
    AppConfig, ConfigError, DirectoryConfig, GroqConfig, LoggingConfig, ModerationConfig,
    RateLimitConfig, RetryConfig,
};

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_lookup(|key| env::var(key).ok())
}

impl AppConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = match var("GROQ_API_URL") {
            Some(raw) => Url::parse(&raw).map_err(|_| ConfigError::Invalid {
                key: "GROQ_API_URL",
                value: raw.clone(),
            })?,
            None => Url::parse(DEFAULT_API_URL).map_err(|_| ConfigError::Invalid {
                key: "GROQ_API_URL",
                value: DEFAULT_API_URL.to_string(),
            })?,
        };
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: "GROQ_API_URL",
                value: api_url.to_string(),
            });
        }

        let groq = GroqConfig {
            api_key: var("GROQ_API_KEY"),
            model: var("GROQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_url,
            max_tokens: parse_or(&var, "GROQ_MAX_TOKENS", 1_000),
            request_timeout: Duration::from_secs(parse_or(&var, "GROQ_REQUEST_TIMEOUT_SECS", 30)),
        };

        let max_requests_per_window: usize = parse_or(&var, "MAX_REQUESTS_PER_MINUTE", 30);
        if max_requests_per_window == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_REQUESTS_PER_MINUTE",
                value: "0".to_string(),
            });
        }
        let rate_limit = RateLimitConfig {
            max_requests_per_window,
            window: Duration::from_secs(60),
            min_spacing: Duration::from_millis(parse_or(&var, "MIN_REQUEST_SPACING_MS", 1_000)),
            safety_margin: Duration::from_secs(1),
        };

        let max_attempts: u32 = parse_or(&var, "MAX_ATTEMPTS", 3);
        let retry = RetryConfig {
            max_attempts: max_attempts.max(1),
            base_backoff: Duration::from_millis(parse_or(&var, "RETRY_BASE_BACKOFF_MS", 1_000)),
            rate_limit_wait: Duration::from_secs(parse_or(&var, "RATE_LIMIT_WAIT_SECS", 60)),
        };

        let moderation = ModerationConfig {
            confidence_score: var("CONFIDENCE_SCORE")
                .map(|v| parse_bool(&v))
                .unwrap_or(true),
            prompt_template_path: var("PROMPT_TEMPLATE_PATH").map(PathBuf::from),
        };

        let directories = DirectoryConfig {
            logs_dir: var("LOGS_DIR").unwrap_or_else(|| "logs".to_string()),
            results_dir: var("RESULTS_DIR").unwrap_or_else(|| "results".to_string()),
        };

        let logging = LoggingConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        Ok(Self {
            groq,
            rate_limit,
            retry,
            moderation,
            directories,
            logging,
        })
    }
}

fn parse_or<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    var(key)
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> bool {
    !matches!(
        value.to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
