use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};

use crate::config::GroqConfig;

use super::{
    error::ServiceError,
    inference::{extract_content, ApiErrorEnvelope, ChatCompletionRequest, ChatCompletionResponse},
};

/// One request/response exchange with a chat-completion provider.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, ServiceError>;
}

#[async_trait]
impl<T: CompletionTransport + ?Sized> CompletionTransport for Arc<T> {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, ServiceError> {
        self.as_ref().complete(request).await
    }
}

#[derive(Clone)]
pub struct GroqClient {
    http: Client,
    config: GroqConfig,
    api_key: String,
}

impl GroqClient {
    pub fn new(http: Client, config: GroqConfig, api_key: String) -> Self {
        Self {
            http,
            config,
            api_key,
        }
    }
}

#[async_trait]
impl CompletionTransport for GroqClient {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, ServiceError> {
        let response = self
            .http
            .post(self.config.api_url.clone())
            .bearer_auth(&self.api_key)
            .timeout(self.config.request_timeout)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ServiceError::Transient(format!(
                        "request timed out after {:?}",
                        self.config.request_timeout
                    ))
                } else {
                    ServiceError::Transient(err.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::OK {
            let completion: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|err| ServiceError::Transient(format!("unreadable completion: {err}")))?;
            return extract_content(completion).ok_or_else(|| {
                ServiceError::Transient("completion did not contain any message content".into())
            });
        }

        let retry_after = parse_retry_after(
            response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok()),
        );
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));

        Err(ServiceError::from_status(status.as_u16(), message, retry_after))
    }
}

fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;
    use crate::ai::inference::build_request;

    const COMPLETIONS_PATH: &str = "/openai/v1/chat/completions";

    fn config_for(api_url: &str) -> GroqConfig {
        GroqConfig {
            api_key: None,
            model: "m".into(),
            api_url: url::Url::parse(api_url).unwrap(),
            max_tokens: 10,
            request_timeout: Duration::from_secs(2),
        }
    }

    async fn complete_against(server: &MockServer) -> Result<String, ServiceError> {
        let config = config_for(&format!("{}{COMPLETIONS_PATH}", server.uri()));
        let client = GroqClient::new(Client::new(), config, "key".into());
        client.complete(&build_request("m", "p", 10)).await
    }

    async fn mount(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[test]
    fn retry_after_accepts_whole_seconds_only() {
        assert_eq!(parse_retry_after(Some("12")), Some(Duration::from_secs(12)));
        assert_eq!(parse_retry_after(Some(" 3 ")), Some(Duration::from_secs(3)));
        assert_eq!(parse_retry_after(Some("Wed, 21 Oct 2015 07:28:00 GMT")), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[tokio::test]
    async fn connection_failure_is_transient() {
        let config = config_for("http://127.0.0.1:9/v1/chat/completions");
        let client = GroqClient::new(Client::new(), config, "key".into());
        let err = client.complete(&build_request("m", "p", 10)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Transient(_)));
    }

    #[tokio::test]
    async fn ok_response_yields_trimmed_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .and(header("authorization", "Bearer key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "  {\"labels_spam\": 0}\n" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let content = complete_against(&server).await.unwrap();
        assert_eq!(content, "{\"labels_spam\": 0}");
    }

    #[tokio::test]
    async fn too_many_requests_carries_retry_after_hint() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_json(json!({ "error": { "message": "slow down" } })),
        )
        .await;

        let err = complete_against(&server).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(7)
        ));
    }

    #[tokio::test]
    async fn too_many_requests_without_hint_has_no_wait() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(429)).await;

        let err = complete_against(&server).await.unwrap_err();
        assert!(matches!(err, ServiceError::RateLimited { retry_after: None }));
    }

    #[tokio::test]
    async fn bad_request_is_fatal_with_provider_message() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(400)
                .set_body_json(json!({ "error": { "message": "model not found" } })),
        )
        .await;

        let err = complete_against(&server).await.unwrap_err();
        match err {
            ServiceError::Fatal { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "model not found");
            }
            other => panic!("expected fatal error, got {other:?}"),
        }
        assert!(!complete_against(&server).await.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn server_error_without_envelope_is_transient() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(503).set_body_string("upstream down")).await;

        let err = complete_against(&server).await.unwrap_err();
        match err {
            ServiceError::Transient(message) => assert!(message.contains("503")),
            other => panic!("expected transient error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ok_response_with_no_choices_is_transient() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })),
        )
        .await;

        let err = complete_against(&server).await.unwrap_err();
        assert!(matches!(err, ServiceError::Transient(_)));
    }

    #[tokio::test]
    async fn ok_response_with_unreadable_body_is_transient() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

        let err = complete_against(&server).await.unwrap_err();
        assert!(matches!(err, ServiceError::Transient(_)));
    }
}
