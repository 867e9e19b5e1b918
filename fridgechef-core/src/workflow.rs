//! Recipe workflow: generation, response shaping, and the image generation
//! trigger.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::error::GenerationError;
use crate::generation::RecipeGenerator;
use crate::image::ImageWorker;
use crate::types::{GeneratedRecipe, RecipeFilters, RecipeId};

/// Error type for the persistence collaborator.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Persistence collaborator for generated recipes.
///
/// Implemented outside this crate by the storage layer; saving a recipe
/// yields the durable integer id that replaces its temporary string id.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Persist a recipe, returning its durable id.
    async fn save(&self, recipe: &GeneratedRecipe) -> Result<i64, RepositoryError>;

    /// Fetch a persisted recipe by durable id.
    async fn get(&self, id: i64) -> Result<Option<GeneratedRecipe>, RepositoryError>;
}

/// In-memory repository for tests and local development.
pub struct InMemoryRecipeRepository {
    next_id: AtomicI64,
    recipes: Mutex<HashMap<i64, GeneratedRecipe>>,
}

impl InMemoryRecipeRepository {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            recipes: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRecipeRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecipeRepository for InMemoryRecipeRepository {
    async fn save(&self, recipe: &GeneratedRecipe) -> Result<i64, RepositoryError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut stored = recipe.clone();
        stored.id = RecipeId::Durable(id);
        self.recipes.lock().unwrap().insert(id, stored);
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Option<GeneratedRecipe>, RepositoryError> {
        Ok(self.recipes.lock().unwrap().get(&id).cloned())
    }
}

/// Ties recipe generation to image generation.
///
/// Recipes are generated and returned synchronously; image tasks are
/// registered and run in the background without blocking the response.
pub struct RecipeWorkflow {
    generator: RecipeGenerator,
    worker: ImageWorker,
}

impl RecipeWorkflow {
    pub fn new(generator: RecipeGenerator, worker: ImageWorker) -> Self {
        Self { generator, worker }
    }

    pub fn image_worker(&self) -> &ImageWorker {
        &self.worker
    }

    /// Generate recipes for the given ingredients, shape them for callers,
    /// and start background image generation for each one.
    pub async fn generate_recipes(
        &self,
        ingredients: &[String],
        filters: Option<&RecipeFilters>,
    ) -> Result<Vec<GeneratedRecipe>, GenerationError> {
        let payloads = self.generator.generate(ingredients, filters).await?;

        let created_at = Utc::now();
        let millis = created_at.timestamp_millis();
        let recipes: Vec<GeneratedRecipe> = payloads
            .into_iter()
            .enumerate()
            .map(|(index, payload)| {
                GeneratedRecipe::from_payload(payload, RecipeId::temp(millis, index), created_at)
            })
            .collect();

        tracing::info!(
            count = recipes.len(),
            "Starting async image generation for generated recipes"
        );
        self.worker.start_batch(&recipes);

        Ok(recipes)
    }

    /// Persist a recipe through the given repository, reassigning its id
    /// from temporary to durable.
    pub async fn persist_recipe(
        &self,
        repository: &dyn RecipeRepository,
        mut recipe: GeneratedRecipe,
    ) -> Result<GeneratedRecipe, RepositoryError> {
        let id = repository.save(&recipe).await?;
        recipe.id = RecipeId::Durable(id);
        tracing::info!(recipe_id = id, "Recipe saved");
        Ok(recipe)
    }
}
