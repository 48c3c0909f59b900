pub mod client;
pub mod error;
pub mod inference;
pub mod prompt;
pub mod rate_limiter;
pub mod service;

pub use client::{CompletionTransport, GroqClient};
pub use error::ServiceError;
pub use prompt::PromptTemplate;
pub use rate_limiter::RateLimiter;
pub use service::ServiceClient;
