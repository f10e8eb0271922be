use anyhow::{Context, Result};

use crate::retry::RetryPolicy;

/// Provider configuration loaded from environment variables.
///
/// The engine speaks the OpenAI chat-completions wire format, which DeepSeek
/// (and compatible providers) expose; only the base URL and model name vary.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl LlmConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(LlmConfig {
            api_key: require_env("DEEPSEEK_API_KEY")?,
            base_url: std::env::var("DEEPSEEK_BASE_URL")
                .unwrap_or_else(|_| "https://api.deepseek.com".to_string()),
            model: std::env::var("DEEPSEEK_MODEL").unwrap_or_else(|_| "deepseek-chat".to_string()),
            max_tokens: std::env::var("LLM_MAX_TOKENS")
                .unwrap_or_else(|_| "4096".to_string())
                .parse::<u32>()
                .context("LLM_MAX_TOKENS must be a positive integer")?,
            temperature: 0.7,
        })
    }
}

/// Policy for a non-transient provider failure (auth, quota) on the very
/// first batch, before any content exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstBatchFailurePolicy {
    /// Surface the provider error to the caller; no roadmap is returned.
    /// A never-attempted roadmap is not the same thing as a degraded one.
    Abort,
    /// Build the first batch from templates like any later batch.
    Fallback,
}

/// Engine tuning knobs. All of these are deliberate configuration rather than
/// constants: the batch size tracks the provider's output ceiling, and the
/// context tail size is an empirical tuning value.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Weeks requested per provider call. 3 keeps a "7 days, ~5 tasks/day"
    /// week safely under the output token ceiling.
    pub weeks_per_batch: u32,
    /// How many trailing days of the previous batch prime the next prompt.
    pub context_tail_days: usize,
    pub retry: RetryPolicy,
    pub first_batch_failure: FirstBatchFailurePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weeks_per_batch: 3,
            context_tail_days: 2,
            retry: RetryPolicy::default(),
            first_batch_failure: FirstBatchFailurePolicy::Abort,
        }
    }
}

impl EngineConfig {
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_first_batch_failure(mut self, policy: FirstBatchFailurePolicy) -> Self {
        self.first_batch_failure = policy;
        self
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.weeks_per_batch, 3);
        assert_eq!(config.context_tail_days, 2);
        assert_eq!(config.first_batch_failure, FirstBatchFailurePolicy::Abort);
    }

    #[test]
    fn test_engine_config_builders() {
        let config = EngineConfig::default()
            .with_retry(RetryPolicy::zeroed())
            .with_first_batch_failure(FirstBatchFailurePolicy::Fallback);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.first_batch_failure, FirstBatchFailurePolicy::Fallback);
    }
}
