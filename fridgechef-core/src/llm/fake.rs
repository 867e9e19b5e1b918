//! Fake LLM provider for testing.
//!
//! This provider returns deterministic responses based on prompt matching,
//! allowing tests to run without network access or API costs.

use super::{LlmError, LlmProvider};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// A fake LLM provider for testing.
///
/// Responses are matched by checking if the prompt contains a registered
/// substring. If no match is found, returns a default response or error.
#[derive(Debug)]
pub struct FakeProvider {
    /// Map of prompt substring -> response
    responses: RwLock<HashMap<String, String>>,
    /// Default response if no match found
    default_response: Option<String>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            responses: RwLock::new(HashMap::new()),
            default_response: Some("[]".to_string()),
        }
    }
}

impl FakeProvider {
    /// Create a new FakeProvider with no registered responses.
    pub fn new() -> Self {
        Self {
            responses: RwLock::new(HashMap::new()),
            default_response: None,
        }
    }

    /// Create a FakeProvider that returns a specific response for prompts
    /// containing a substring.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let mut provider = Self::new();
        provider.add_response(prompt_contains, response);
        provider
    }

    /// Add a response for prompts containing a specific substring.
    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .write()
            .unwrap()
            .insert(prompt_contains.to_string(), response.to_string());
    }

    /// Set the default response when no pattern matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Create a FakeProvider that answers every prompt with a small valid
    /// recipe array, for wiring tests and local development.
    pub fn with_recipe_responses() -> Self {
        Self::new().with_default_response(
            r#"[
                {
                    "name": "番茄炒蛋",
                    "cuisine": 1,
                    "tasteBase": 2,
                    "spiceLevel": 0,
                    "cookingTimeMinutes": 15,
                    "difficulty": 1,
                    "ingredients": {
                        "available": [
                            {"name": "番茄", "quantity": 2, "unit": "个"},
                            {"name": "鸡蛋", "quantity": 3, "unit": "个"}
                        ],
                        "needed": [
                            {"name": "葱", "quantity": 1, "unit": "根"}
                        ]
                    },
                    "steps": ["番茄切块，鸡蛋打散", "热锅倒油，炒鸡蛋至凝固", "加入番茄翻炒，加盐调味出锅"],
                    "nutritionAnalysis": {"calories": 180, "protein": 10, "carbs": 8, "fat": 12}
                }
            ]"#,
        )
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let responses = self.responses.read().unwrap();

        // Find first matching pattern (case-insensitive)
        let prompt_lower = prompt.to_lowercase();
        for (pattern, response) in responses.iter() {
            if prompt_lower.contains(&pattern.to_lowercase()) {
                return Ok(response.clone());
            }
        }

        // Return default or error
        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(LlmError::RequestFailed(format!(
                "FakeProvider: No response configured for prompt (first 100 chars): {}",
                prompt.chars().take(100).collect::<String>()
            ))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}
