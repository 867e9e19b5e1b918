pub mod error;
pub mod generation;
pub mod image;
pub mod labels;
pub mod llm;
pub mod types;
pub mod workflow;

pub use error::GenerationError;
pub use generation::{RecipeCache, RecipeGenerator, CACHE_TTL};
pub use image::{
    ImagePollerSet, ImageStatusSource, ImageSynthesisApi, ImageTask, ImageTaskStatus,
    ImageTaskStore, ImageWorker, MockImageApi,
};
pub use types::{
    GeneratedRecipe, IngredientItem, NutritionAnalysis, RecipeFilters, RecipeId,
    RecipeIngredients, RecipePayload,
};
pub use workflow::{InMemoryRecipeRepository, RecipeRepository, RecipeWorkflow, RepositoryError};
