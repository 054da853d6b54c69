use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};
use ts_rs::TS;

use crate::services::config::CompletionConfig;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion request timed out")]
    Timeout,
    #[error("Completion service rate limited the request")]
    RateLimited,
    #[error("Completion service rejected the credentials")]
    Auth,
    #[error("Completion service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Completion request failed: {0}")]
    Network(reqwest::Error),
    #[error("Completion service returned no text content")]
    EmptyResponse,
}

/// One (role, content) turn submitted to the completion service.
#[derive(Debug, Clone, Serialize)]
pub struct TurnMessage {
    pub role: String,
    pub content: String,
}

/// Token accounting reported by the completion service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub text: String,
    pub usage: Usage,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [TurnMessage],
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Client for the external text-completion service (Anthropic-style messages
/// endpoint). Requests are bounded by the configured timeout; a timed-out
/// call surfaces as [`CompletionError::Timeout`] rather than hanging the
/// handler.
#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    config: CompletionConfig,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Submit a system instruction plus ordered turns and return the
    /// generated text with usage metadata.
    pub async fn complete(
        &self,
        system: &str,
        messages: &[TurnMessage],
    ) -> Result<CompletionOutcome, CompletionError> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system,
            messages,
        };

        debug!(
            "Requesting completion from {} ({} turns)",
            self.config.base_url,
            messages.len()
        );

        let response = self
            .http
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout
                } else {
                    CompletionError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Completion service error {}: {}", status, body);
            return Err(match status.as_u16() {
                429 => CompletionError::RateLimited,
                401 | 403 => CompletionError::Auth,
                code => CompletionError::Api { status: code, body },
            });
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout
            } else {
                CompletionError::Network(e)
            }
        })?;

        let text: String = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(CompletionError::EmptyResponse);
        }

        Ok(CompletionOutcome {
            text,
            usage: parsed.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_config(base_url: String) -> CompletionConfig {
        CompletionConfig {
            base_url,
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            max_tokens: 256,
            timeout: Duration::from_millis(250),
        }
    }

    fn turns() -> Vec<TurnMessage> {
        vec![TurnMessage {
            role: "user".to_string(),
            content: "hello".to_string(),
        }]
    }

    #[tokio::test]
    async fn parses_text_blocks_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(body_partial_json(json!({"model": "test-model"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [
                    {"type": "text", "text": "Hello, "},
                    {"type": "text", "text": "world."}
                ],
                "usage": {"input_tokens": 12, "output_tokens": 5}
            })))
            .mount(&server)
            .await;

        let client = CompletionClient::new(test_config(server.uri())).unwrap();
        let outcome = client.complete("system", &turns()).await.unwrap();
        assert_eq!(outcome.text, "Hello, world.");
        assert_eq!(outcome.usage.input_tokens, 12);
        assert_eq!(outcome.usage.output_tokens, 5);
    }

    #[tokio::test]
    async fn rate_limit_maps_to_distinct_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = CompletionClient::new(test_config(server.uri())).unwrap();
        let err = client.complete("system", &turns()).await.unwrap_err();
        assert!(matches!(err, CompletionError::RateLimited));
    }

    #[tokio::test]
    async fn auth_failure_maps_to_distinct_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = CompletionClient::new(test_config(server.uri())).unwrap();
        let err = client.complete("system", &turns()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Auth));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(json!({
                        "content": [{"type": "text", "text": "too late"}],
                        "usage": {"input_tokens": 1, "output_tokens": 1}
                    })),
            )
            .mount(&server)
            .await;

        let client = CompletionClient::new(test_config(server.uri())).unwrap();
        let err = client.complete("system", &turns()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Timeout));
    }

    #[tokio::test]
    async fn all_non_text_content_is_an_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "tool_use", "text": ""}],
                "usage": {"input_tokens": 1, "output_tokens": 0}
            })))
            .mount(&server)
            .await;

        let client = CompletionClient::new(test_config(server.uri())).unwrap();
        let err = client.complete("system", &turns()).await.unwrap_err();
        assert!(matches!(err, CompletionError::EmptyResponse));
    }
}
