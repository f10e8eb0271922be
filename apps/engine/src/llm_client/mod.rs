//! LLM Client — the single point of entry for all provider calls in the engine.
//!
//! ARCHITECTURAL RULE: No other module may talk to the provider directly.
//! All generation traffic MUST go through a [`ChatSession`] opened here.
//!
//! The wire format is the OpenAI chat-completions API, which DeepSeek and
//! compatible providers expose. A session owns the conversation turn history
//! for one roadmap assembly, so continuation prompts do not need to restate
//! everything generated so far.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::LlmConfig;

pub mod prompts;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Classified provider failure. The transient kinds are retry candidates;
/// auth and quota failures are not worth retrying.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("rate limited by provider")]
    RateLimited,

    #[error("provider quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("provider authentication failed")]
    AuthFailure,

    #[error("provider returned empty content")]
    EmptyContent,
}

impl ProviderError {
    /// Whether a retry with backoff is worth attempting.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout
                | ProviderError::Transport(_)
                | ProviderError::Upstream { .. }
                | ProviderError::RateLimited
                | ProviderError::EmptyContent
        )
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

/// A stateful generation session: one conversation with the provider,
/// accumulating turn history across sequential sends.
///
/// The session performs no retries itself; classifying-and-retrying is the
/// orchestrator's job, driven by an injected retry policy.
#[async_trait]
pub trait ChatSession: Send {
    async fn send(&mut self, prompt: &str) -> Result<String, ProviderError>;
}

/// The provider client. Cheap to clone; sessions borrow its HTTP client.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            config,
        }
    }

    /// Opens a fresh session seeded with a system prompt. One session spans
    /// one roadmap assembly; it is closed by dropping it.
    pub fn open_session(&self, system_prompt: &str) -> OpenAiChatSession {
        OpenAiChatSession {
            client: self.client.clone(),
            config: self.config.clone(),
            messages: vec![ChatMessage {
                role: "system".to_string(),
                content: system_prompt.to_string(),
            }],
        }
    }
}

/// Concrete session against an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiChatSession {
    client: Client,
    config: LlmConfig,
    messages: Vec<ChatMessage>,
}

impl OpenAiChatSession {
    /// Number of turns (excluding the system prompt) held in history.
    pub fn turn_count(&self) -> usize {
        self.messages.len().saturating_sub(1)
    }
}

#[async_trait]
impl ChatSession for OpenAiChatSession {
    async fn send(&mut self, prompt: &str) -> Result<String, ProviderError> {
        self.messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let result = self.post_history().await;

        match result {
            Ok(content) => {
                self.messages.push(ChatMessage {
                    role: "assistant".to_string(),
                    content: content.clone(),
                });
                Ok(content)
            }
            Err(e) => {
                // Keep history consistent: a failed send leaves no user turn
                // behind, so a retry does not stack duplicate prompts.
                self.messages.pop();
                Err(e)
            }
        }
    }
}

impl OpenAiChatSession {
    async fn post_history(&self) -> Result<String, ProviderError> {
        let request_body = ChatRequest {
            model: &self.config.model,
            messages: &self.messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}{}", self.config.base_url, CHAT_COMPLETIONS_PATH);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(classify_status(status.as_u16(), message));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if let Some(usage) = &chat_response.usage {
            debug!(
                "provider call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ProviderError::EmptyContent)
    }
}

fn classify_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Transport(e.to_string())
    }
}

/// Maps an HTTP status to a failure class. DeepSeek signals exhausted balance
/// with 402; 401/403 are credential problems; 429 is rate pressure; 5xx is
/// the provider's problem and worth retrying.
fn classify_status(status: u16, message: String) -> ProviderError {
    match status {
        401 | 403 => ProviderError::AuthFailure,
        402 => ProviderError::QuotaExhausted(message),
        429 => {
            let lower = message.to_lowercase();
            if lower.contains("quota") || lower.contains("balance") {
                ProviderError::QuotaExhausted(message)
            } else {
                ProviderError::RateLimited
            }
        }
        s if s >= 500 => ProviderError::Upstream { status, message },
        _ => ProviderError::Upstream { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> LlmConfig {
        LlmConfig {
            api_key: "test-key".to_string(),
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }

    #[test]
    fn test_classify_status_auth() {
        assert!(matches!(
            classify_status(401, "bad key".to_string()),
            ProviderError::AuthFailure
        ));
        assert!(matches!(
            classify_status(403, "forbidden".to_string()),
            ProviderError::AuthFailure
        ));
    }

    #[test]
    fn test_classify_status_quota_via_402() {
        assert!(matches!(
            classify_status(402, "Insufficient Balance".to_string()),
            ProviderError::QuotaExhausted(_)
        ));
    }

    #[test]
    fn test_classify_status_quota_via_429_body() {
        assert!(matches!(
            classify_status(429, "monthly quota exceeded".to_string()),
            ProviderError::QuotaExhausted(_)
        ));
    }

    #[test]
    fn test_classify_status_rate_limit() {
        assert!(matches!(
            classify_status(429, "slow down".to_string()),
            ProviderError::RateLimited
        ));
    }

    #[test]
    fn test_classify_status_server_error_is_transient() {
        let err = classify_status(503, "unavailable".to_string());
        assert!(matches!(err, ProviderError::Upstream { status: 503, .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_non_transient_kinds() {
        assert!(!ProviderError::AuthFailure.is_transient());
        assert!(!ProviderError::QuotaExhausted("x".to_string()).is_transient());
        assert!(ProviderError::Timeout.is_transient());
        assert!(ProviderError::RateLimited.is_transient());
    }

    #[test]
    fn test_session_starts_with_no_turns() {
        let client = LlmClient::new(test_config());
        let session = client.open_session("You are a mentor.");
        assert_eq!(session.turn_count(), 0);
    }
}
