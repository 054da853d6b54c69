use std::env;
use std::time::Duration;

/// Settings for the external text-completion service, read from the
/// environment. Defaults are production values; tests override `base_url`
/// to point at a local mock server.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl CompletionConfig {
    pub fn from_env() -> Self {
        let base_url = env::var("COMPLETION_BASE_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com".to_string());
        let api_key = env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        let model = env::var("COMPLETION_MODEL")
            .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());
        let max_tokens = env::var("COMPLETION_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4096);
        let timeout_secs = env::var("COMPLETION_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        if api_key.is_empty() {
            tracing::warn!("ANTHROPIC_API_KEY is not set; assistant requests will be rejected upstream");
        }

        Self {
            base_url,
            api_key,
            model,
            max_tokens,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}
