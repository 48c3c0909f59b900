use std::time::Duration;

use tokio::time::sleep;

use crate::{
    config::{GroqConfig, RetryConfig},
    domain::ContentItem,
};

use super::{
    client::CompletionTransport,
    error::ServiceError,
    inference::build_request,
    prompt::PromptTemplate,
    rate_limiter::RateLimiter,
};

/// Issues one classification request per item through the rate limiter,
/// retrying rate-limited and transient failures within a fixed attempt budget.
pub struct ServiceClient<T> {
    transport: T,
    limiter: RateLimiter,
    retry: RetryConfig,
    model: String,
    max_tokens: u32,
}

impl<T: CompletionTransport> ServiceClient<T> {
    pub fn new(transport: T, limiter: RateLimiter, retry: RetryConfig, groq: &GroqConfig) -> Self {
        Self {
            transport,
            limiter,
            retry,
            model: groq.model.clone(),
            max_tokens: groq.max_tokens,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.retry.max_attempts.max(1)
    }

    pub async fn classify(
        &mut self,
        item: &ContentItem,
        template: &PromptTemplate,
    ) -> Result<String, ServiceError> {
        let request = build_request(&self.model, &template.render(&item.content), self.max_tokens);
        let max_attempts = self.max_attempts();
        let mut attempt = 0;

        loop {
            self.limiter.admit().await;
            let err = match self.transport.complete(&request).await {
                Ok(text) => return Ok(text),
                Err(err) => err,
            };

            if !err.is_retryable() {
                tracing::warn!(
                    target: "service",
                    uid = %item.uid,
                    error = %err,
                    "request rejected, not retrying"
                );
                return Err(err);
            }
            let wait = match &err {
                ServiceError::RateLimited { retry_after } => {
                    retry_after.unwrap_or(self.retry.rate_limit_wait)
                }
                _ => backoff(self.retry.base_backoff, attempt),
            };

            attempt += 1;
            if attempt >= max_attempts {
                tracing::warn!(
                    target: "service",
                    uid = %item.uid,
                    attempts = attempt,
                    error = %err,
                    "retry budget exhausted"
                );
                return Err(ServiceError::RetryBudgetExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            tracing::warn!(
                target: "service",
                uid = %item.uid,
                attempt,
                max_attempts,
                wait_ms = wait.as_millis() as u64,
                error = %err,
                "request failed, retrying"
            );
            sleep(wait).await;
        }
    }
}

/// `base * 2^attempt`, saturating.
fn backoff(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{collections::VecDeque, sync::Mutex};

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::{ai::inference::ChatCompletionRequest, config::RateLimitConfig};

    /// Replays a fixed script of outcomes and records every prompt it sees.
    pub(crate) struct ScriptedTransport {
        script: Mutex<VecDeque<Result<String, ServiceError>>>,
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(script: Vec<Result<String, ServiceError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionTransport for ScriptedTransport {
        async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, ServiceError> {
            let prompt = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            self.calls.lock().unwrap().push(prompt);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ServiceError::Transient("script exhausted".into())))
        }
    }

    pub(crate) fn test_groq() -> GroqConfig {
        GroqConfig {
            api_key: Some("key".into()),
            model: "test-model".into(),
            api_url: url::Url::parse("http://localhost/v1/chat/completions").unwrap(),
            max_tokens: 100,
            request_timeout: Duration::from_secs(5),
        }
    }

    pub(crate) fn test_client<T: CompletionTransport>(
        transport: T,
        max_attempts: u32,
    ) -> ServiceClient<T> {
        let limiter = RateLimiter::new(&RateLimitConfig {
            max_requests_per_window: 30,
            window: Duration::from_secs(60),
            min_spacing: Duration::from_secs(1),
            safety_margin: Duration::from_secs(1),
        });
        let retry = RetryConfig {
            max_attempts,
            base_backoff: Duration::from_secs(1),
            rate_limit_wait: Duration::from_secs(60),
        };
        ServiceClient::new(transport, limiter, retry, &test_groq())
    }

    fn item() -> ContentItem {
        ContentItem::new("uid-1", "buy now buy now")
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff(base, 0), Duration::from_secs(1));
        assert_eq!(backoff(base, 1), Duration::from_secs(2));
        assert_eq!(backoff(base, 2), Duration::from_secs(4));
        assert_eq!(backoff(base, 40), base.saturating_mul(u32::MAX));
    }

    #[tokio::test(start_paused = true)]
    async fn success_returns_raw_text_and_renders_template() {
        let transport = std::sync::Arc::new(ScriptedTransport::new(vec![Ok("{}".into())]));
        let mut client = test_client(transport.clone(), 3);
        let template = PromptTemplate::new("Content: {content}").unwrap();

        let text = client.classify(&item(), &template).await.unwrap();
        assert_eq!(text, "{}");
        assert_eq!(
            transport.calls.lock().unwrap().as_slice(),
            ["Content: buy now buy now"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_then_success_uses_hint() {
        let transport = std::sync::Arc::new(ScriptedTransport::new(vec![
            Err(ServiceError::RateLimited {
                retry_after: Some(Duration::from_secs(7)),
            }),
            Ok("{\"labels_spam\": 1}".into()),
        ]));
        let mut client = test_client(transport.clone(), 3);
        let start = Instant::now();

        let text = client
            .classify(&item(), &PromptTemplate::default())
            .await
            .unwrap();
        assert_eq!(text, "{\"labels_spam\": 1}");
        assert_eq!(transport.call_count(), 2);
        assert_eq!(Instant::now() - start, Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_without_hint_waits_default() {
        let transport = std::sync::Arc::new(ScriptedTransport::new(vec![
            Err(ServiceError::RateLimited { retry_after: None }),
            Ok("{}".into()),
        ]));
        let mut client = test_client(transport, 3);
        let start = Instant::now();
        client
            .classify(&item(), &PromptTemplate::default())
            .await
            .unwrap();
        assert_eq!(Instant::now() - start, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_back_off_exponentially() {
        let transport = std::sync::Arc::new(ScriptedTransport::new(vec![
            Err(ServiceError::Transient("timeout".into())),
            Err(ServiceError::Transient("502".into())),
            Ok("{}".into()),
        ]));
        let mut client = test_client(transport.clone(), 3);
        let start = Instant::now();
        client
            .classify(&item(), &PromptTemplate::default())
            .await
            .unwrap();
        // 1s then 2s of backoff; spacing is already satisfied by the waits.
        assert_eq!(Instant::now() - start, Duration::from_secs(3));
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_aborts_without_retry() {
        let transport = std::sync::Arc::new(ScriptedTransport::new(vec![
            Err(ServiceError::Fatal {
                status: 400,
                message: "bad request".into(),
            }),
            Ok("{}".into()),
        ]));
        let mut client = test_client(transport.clone(), 3);
        let err = client
            .classify(&item(), &PromptTemplate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Fatal { status: 400, .. }));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_reports_last_error_without_trailing_sleep() {
        let transport = std::sync::Arc::new(ScriptedTransport::new(vec![
            Err(ServiceError::Transient("a".into())),
            Err(ServiceError::RateLimited {
                retry_after: Some(Duration::from_secs(5)),
            }),
            Err(ServiceError::Transient("c".into())),
        ]));
        let mut client = test_client(transport.clone(), 3);
        let start = Instant::now();
        let err = client
            .classify(&item(), &PromptTemplate::default())
            .await
            .unwrap_err();

        match err {
            ServiceError::RetryBudgetExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, ServiceError::Transient(ref m) if m == "c"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.call_count(), 3);
        assert_eq!(Instant::now() - start, Duration::from_secs(6));
    }
}
