//! AI recipe generation: prompt building, response validation, caching,
//! and the orchestrator that ties them together.

mod cache;
mod parse;
mod prompt;

pub use cache::{cache_key, RecipeCache, CACHE_TTL};
pub use parse::parse_recipes;
pub use prompt::render_recipe_prompt;

use std::sync::Arc;

use crate::error::GenerationError;
use crate::llm::LlmProvider;
use crate::types::{RecipeFilters, RecipePayload};

/// Synchronous entry point for AI recipe generation.
///
/// Owns the generation cache; a hit skips the model call entirely. Upstream
/// failures propagate directly with no retry and no fallback data.
pub struct RecipeGenerator {
    provider: Arc<dyn LlmProvider>,
    cache: RecipeCache,
}

impl RecipeGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self::with_cache(provider, RecipeCache::new())
    }

    pub fn with_cache(provider: Arc<dyn LlmProvider>, cache: RecipeCache) -> Self {
        Self { provider, cache }
    }

    /// Generate recipes for the given ingredients and optional filters.
    ///
    /// `ingredients` is expected to be non-empty; empty input is rejected by
    /// the request layer before it reaches this call.
    pub async fn generate(
        &self,
        ingredients: &[String],
        filters: Option<&RecipeFilters>,
    ) -> Result<Vec<RecipePayload>, GenerationError> {
        let key = cache::cache_key(ingredients, filters);

        if let Some(recipes) = self.cache.get(&key) {
            tracing::info!(count = recipes.len(), "Returning cached recipe set");
            return Ok(recipes);
        }

        let prompt = prompt::render_recipe_prompt(ingredients, filters);

        tracing::info!(
            provider = self.provider.provider_name(),
            model = self.provider.model_name(),
            ingredient_count = ingredients.len(),
            "Generating recipes"
        );

        let raw = self.provider.complete(&prompt).await?;
        let recipes = parse::parse_recipes(&raw)?;

        self.cache.put(key, recipes.clone());

        tracing::info!(count = recipes.len(), "Recipe generation succeeded");
        Ok(recipes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{FakeProvider, LlmError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const VALID_RESPONSE: &str = r#"[{
        "name": "番茄炒蛋",
        "cuisine": 1,
        "cookingTimeMinutes": 15,
        "difficulty": 1,
        "ingredients": {"available": [], "needed": []},
        "steps": ["做"]
    }]"#;

    /// Wraps a provider and counts completions, so tests can assert how
    /// many times the model was actually called.
    #[derive(Debug)]
    struct CountingProvider {
        inner: FakeProvider,
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn returning(response: &str) -> Self {
            Self {
                inner: FakeProvider::new().with_default_response(response),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for CountingProvider {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.complete(prompt).await
        }

        fn provider_name(&self) -> &'static str {
            "counting"
        }

        fn model_name(&self) -> &str {
            "counting-model"
        }
    }

    fn ingredients() -> Vec<String> {
        vec!["番茄".to_string(), "鸡蛋".to_string()]
    }

    #[tokio::test]
    async fn test_generate_parses_and_returns_recipes() {
        let provider = Arc::new(CountingProvider::returning(VALID_RESPONSE));
        let generator = RecipeGenerator::new(provider.clone());

        let recipes = generator.generate(&ingredients(), None).await.unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].name, "番茄炒蛋");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_second_generate_within_ttl_hits_cache() {
        let provider = Arc::new(CountingProvider::returning(VALID_RESPONSE));
        let generator = RecipeGenerator::new(provider.clone());

        let first = generator.generate(&ingredients(), None).await.unwrap();
        let second = generator.generate(&ingredients(), None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_ingredient_order_does_not_refragment_cache() {
        let provider = Arc::new(CountingProvider::returning(VALID_RESPONSE));
        let generator = RecipeGenerator::new(provider.clone());

        generator.generate(&ingredients(), None).await.unwrap();
        let reversed: Vec<String> = ingredients().into_iter().rev().collect();
        generator.generate(&reversed, None).await.unwrap();

        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_cache_calls_model_again() {
        let provider = Arc::new(CountingProvider::returning(VALID_RESPONSE));
        let generator = RecipeGenerator::new(provider.clone());

        generator.generate(&ingredients(), None).await.unwrap();
        tokio::time::advance(Duration::from_secs(6 * 60)).await;
        generator.generate(&ingredients(), None).await.unwrap();

        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider: Arc<dyn LlmProvider> = Arc::new(FakeProvider::new());
        let generator = RecipeGenerator::new(provider);

        let result = generator.generate(&ingredients(), None).await;
        assert!(matches!(result, Err(GenerationError::Llm(_))));
    }

    #[tokio::test]
    async fn test_empty_recipe_array_is_an_error_not_empty_success() {
        let provider = Arc::new(CountingProvider::returning("[]"));
        let generator = RecipeGenerator::new(provider);

        let result = generator.generate(&ingredients(), None).await;
        assert!(matches!(result, Err(GenerationError::NoValidRecipes)));
    }

    #[tokio::test]
    async fn test_failed_generation_is_not_cached() {
        let provider = Arc::new(CountingProvider::returning("garbage"));
        let generator = RecipeGenerator::new(provider.clone());

        assert!(generator.generate(&ingredients(), None).await.is_err());
        assert!(generator.generate(&ingredients(), None).await.is_err());
        assert_eq!(provider.calls(), 2);
    }
}
