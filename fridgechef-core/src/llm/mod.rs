//! LLM provider abstraction for recipe generation.
//!
//! This module provides a trait-based abstraction over chat-completion
//! providers, with a fake implementation for testing.

mod dashscope;
mod fake;

pub use dashscope::DashscopeProvider;
pub use fake::FakeProvider;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Error type for LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Trait for LLM providers.
///
/// Implementations should be stateless and thread-safe. The provider is
/// responsible for making the API call and returning the model's text
/// response.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Send a prompt to the LLM and get a text response.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Get the provider name (e.g., "dashscope", "fake").
    fn provider_name(&self) -> &'static str;

    /// Get the model name (e.g., "qwen-turbo").
    fn model_name(&self) -> &str;
}

/// Create a provider from environment variables.
///
/// - `FRIDGECHEF_LLM_PROVIDER`: "dashscope" (default) | "fake"
/// - `DASHSCOPE_API_KEY`: API key, required for dashscope
/// - `DASHSCOPE_MODEL`: Model name (default: "qwen-turbo")
/// - `DASHSCOPE_BASE_URL`: API base URL override
pub fn create_provider_from_env() -> Result<Box<dyn LlmProvider>, LlmError> {
    let provider =
        std::env::var("FRIDGECHEF_LLM_PROVIDER").unwrap_or_else(|_| "dashscope".to_string());

    match provider.as_str() {
        "fake" => Ok(Box::new(FakeProvider::with_recipe_responses())),
        "dashscope" => {
            let api_key = std::env::var("DASHSCOPE_API_KEY")
                .map_err(|_| LlmError::NotConfigured("DASHSCOPE_API_KEY not set".to_string()))?;
            let model = std::env::var("DASHSCOPE_MODEL")
                .unwrap_or_else(|_| dashscope::DEFAULT_MODEL.to_string());

            let mut provider = DashscopeProvider::new(api_key, model);
            if let Ok(base_url) = std::env::var("DASHSCOPE_BASE_URL") {
                provider = provider.with_base_url(base_url);
            }
            Ok(Box::new(provider))
        }
        other => Err(LlmError::NotConfigured(format!(
            "Unknown provider: {}",
            other
        ))),
    }
}
