pub mod env;
mod loader;

pub use env::{
    AppConfig, ConfigError, DirectoryConfig, GroqConfig, LoggingConfig, RateLimitConfig,
    RetryConfig,
};
pub use loader::load_config;
