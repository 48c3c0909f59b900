use std::time::Duration;

use thiserror::Error;

/// Failure of one completion request, classified by the transport.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("rate limited by provider (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("transient provider failure: {0}")]
    Transient(String),

    #[error("request rejected with status {status}: {message}")]
    Fatal { status: u16, message: String },

    #[error("gave up after {attempts} attempts: {last}")]
    RetryBudgetExhausted {
        attempts: u32,
        #[source]
        last: Box<ServiceError>,
    },
}

impl ServiceError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::RateLimited { .. } | ServiceError::Transient(_)
        )
    }

    /// Maps a non-success HTTP status onto the retry taxonomy.
    pub fn from_status(status: u16, message: String, retry_after: Option<Duration>) -> Self {
        match status {
            429 => ServiceError::RateLimited { retry_after },
            400 | 401 | 403 | 404 | 413 | 422 => ServiceError::Fatal { status, message },
            _ => ServiceError::Transient(format!("HTTP {status}: {message}")),
        }
    }
}
