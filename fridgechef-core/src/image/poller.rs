//! Client-side polling for recipe images.
//!
//! One poller runs per recipe that was returned without an image URL. Each
//! poller queries task status on a fixed interval and merges the image URL
//! into the locally held recipe set when generation completes. A hard
//! ceiling stops the poller even if the server-side task never reaches a
//! terminal state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use super::api::ImageApiError;
use super::store::{ImageTask, ImageTaskStatus, ImageTaskStore};
use crate::types::GeneratedRecipe;

/// Delay between status queries.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Unconditional ceiling on a poller's lifetime.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// The locally held recipe representation that pollers merge image URLs into.
pub type SharedRecipes = Arc<Mutex<Vec<GeneratedRecipe>>>;

/// Where a poller reads task status from: the in-process store, or the
/// HTTP status endpoint when polling from a client application.
#[async_trait]
pub trait ImageStatusSource: Send + Sync {
    /// Fetch the task for a recipe id; `None` when no task exists.
    async fn fetch_status(&self, recipe_id: &str) -> Result<Option<ImageTask>, ImageApiError>;
}

#[async_trait]
impl ImageStatusSource for ImageTaskStore {
    async fn fetch_status(&self, recipe_id: &str) -> Result<Option<ImageTask>, ImageApiError> {
        Ok(self.get(recipe_id))
    }
}

/// Status source backed by the server's image status endpoint.
pub struct HttpImageStatusSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpImageStatusSource {
    /// `base_url` is the server root, e.g. `http://localhost:8081`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ImageStatusSource for HttpImageStatusSource {
    async fn fetch_status(&self, recipe_id: &str) -> Result<Option<ImageTask>, ImageApiError> {
        let response = self
            .client
            .get(format!(
                "{}/api/images/status/{}",
                self.base_url, recipe_id
            ))
            .send()
            .await
            .map_err(|e| ImageApiError::RequestFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = response.status().as_u16();
        if status != 200 {
            return Err(ImageApiError::ApiError {
                status,
                message: "Status query failed".to_string(),
            });
        }

        let task: ImageTask = response
            .json()
            .await
            .map_err(|e| ImageApiError::ParseError(e.to_string()))?;
        Ok(Some(task))
    }
}

/// The set of active pollers, one per recipe id.
///
/// Starting a poller for a recipe id that already has one replaces it: the
/// prior poller is cancelled first. Pollers for different recipes are
/// independent.
pub struct ImagePollerSet {
    pollers: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl ImagePollerSet {
    pub fn new() -> Self {
        Self {
            pollers: Mutex::new(HashMap::new()),
        }
    }

    /// Start polling for one recipe id.
    pub fn start(
        &self,
        recipe_id: &str,
        source: Arc<dyn ImageStatusSource>,
        recipes: SharedRecipes,
    ) {
        let mut pollers = self.pollers.lock().unwrap();
        if let Some(prior) = pollers.remove(recipe_id) {
            prior.abort();
        }

        let recipe_id = recipe_id.to_string();
        let handle = tokio::spawn(poll_until_image(recipe_id.clone(), source, recipes));
        pollers.insert(recipe_id, handle);
    }

    /// Start a poller for every recipe in the set that lacks an image URL.
    pub fn start_missing(&self, source: &Arc<dyn ImageStatusSource>, recipes: &SharedRecipes) {
        let pending: Vec<String> = {
            let recipes = recipes.lock().unwrap();
            recipes
                .iter()
                .filter(|recipe| recipe.image_url.is_none())
                .map(|recipe| recipe.id.to_string())
                .collect()
        };

        for recipe_id in pending {
            self.start(&recipe_id, source.clone(), recipes.clone());
        }
    }

    /// Cancel the poller for a recipe id, if any.
    pub fn stop(&self, recipe_id: &str) {
        if let Some(handle) = self.pollers.lock().unwrap().remove(recipe_id) {
            handle.abort();
        }
    }

    /// Cancel every active poller.
    pub fn stop_all(&self) {
        let mut pollers = self.pollers.lock().unwrap();
        for (_, handle) in pollers.drain() {
            handle.abort();
        }
    }

    /// Number of pollers still running.
    pub fn active_count(&self) -> usize {
        let mut pollers = self.pollers.lock().unwrap();
        pollers.retain(|_, handle| !handle.is_finished());
        pollers.len()
    }
}

impl Default for ImagePollerSet {
    fn default() -> Self {
        Self::new()
    }
}

async fn poll_until_image(
    recipe_id: String,
    source: Arc<dyn ImageStatusSource>,
    recipes: SharedRecipes,
) {
    let outcome = tokio::time::timeout(POLL_TIMEOUT, async {
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let task = match source.fetch_status(&recipe_id).await {
                Ok(Some(task)) => task,
                Ok(None) => {
                    tracing::debug!(recipe_id = %recipe_id, "No image task yet, continuing to poll");
                    continue;
                }
                Err(e) => {
                    // Query errors are not terminal for the poller.
                    tracing::debug!(recipe_id = %recipe_id, error = %e, "Image status query failed");
                    continue;
                }
            };

            match task.status {
                ImageTaskStatus::Completed => {
                    if let Some(url) = task.image_url {
                        merge_image_url(&recipes, &recipe_id, &url);
                        tracing::info!(recipe_id = %recipe_id, image_url = %url, "Recipe image ready");
                        return;
                    }
                    // Completed without a URL; keep polling.
                }
                ImageTaskStatus::Failed => {
                    tracing::warn!(
                        recipe_id = %recipe_id,
                        error = task.error.as_deref().unwrap_or("Unknown error"),
                        "Image generation failed, giving up"
                    );
                    return;
                }
                ImageTaskStatus::Pending | ImageTaskStatus::Generating => {}
            }
        }
    })
    .await;

    if outcome.is_err() {
        tracing::warn!(recipe_id = %recipe_id, "Image polling timed out");
    }
}

fn merge_image_url(recipes: &SharedRecipes, recipe_id: &str, url: &str) {
    let mut recipes = recipes.lock().unwrap();
    if let Some(recipe) = recipes
        .iter_mut()
        .find(|recipe| recipe.id.to_string() == recipe_id)
    {
        recipe.image_url = Some(url.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RecipeId, RecipeIngredients, RecipePayload};
    use chrono::Utc;

    fn recipe(id: usize, name: &str) -> GeneratedRecipe {
        let payload = RecipePayload {
            name: name.to_string(),
            cuisine: 1,
            taste_base: None,
            spice_level: None,
            cooking_time_minutes: 15,
            difficulty: 1,
            ingredients: RecipeIngredients {
                available: vec![],
                needed: vec![],
            },
            steps: vec!["做".to_string()],
            nutrition_analysis: None,
        };
        GeneratedRecipe::from_payload(payload, RecipeId::temp(1, id), Utc::now())
    }

    fn shared(recipes: Vec<GeneratedRecipe>) -> SharedRecipes {
        Arc::new(Mutex::new(recipes))
    }

    /// Let virtual time advance until every poller has stopped. The sleep
    /// keeps the test task off the ready queue so the paused clock can
    /// auto-advance past the pollers' timers.
    async fn wait_until_idle(pollers: &ImagePollerSet) {
        for _ in 0..300 {
            if pollers.active_count() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        panic!("pollers did not stop within the test budget");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_merges_url_and_stops_on_completion() {
        let store = Arc::new(ImageTaskStore::new());
        store.create("temp-1-0", "番茄炒蛋");
        store.set_generating("temp-1-0");
        store.complete("temp-1-0", "http://x".to_string());

        let recipes = shared(vec![recipe(0, "番茄炒蛋")]);
        let pollers = ImagePollerSet::new();
        let source: Arc<dyn ImageStatusSource> = store;

        pollers.start("temp-1-0", source, recipes.clone());
        wait_until_idle(&pollers).await;

        assert_eq!(
            recipes.lock().unwrap()[0].image_url.as_deref(),
            Some("http://x")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_stops_on_failed_task_without_merging() {
        let store = Arc::new(ImageTaskStore::new());
        store.create("temp-1-0", "番茄炒蛋");
        store.fail("temp-1-0", "boom");

        let recipes = shared(vec![recipe(0, "番茄炒蛋")]);
        let pollers = ImagePollerSet::new();
        let source: Arc<dyn ImageStatusSource> = store;

        pollers.start("temp-1-0", source, recipes.clone());
        wait_until_idle(&pollers).await;

        assert!(recipes.lock().unwrap()[0].image_url.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_times_out_when_no_task_ever_terminates() {
        // Empty store: fetch_status keeps returning None.
        let store = Arc::new(ImageTaskStore::new());
        let recipes = shared(vec![recipe(0, "番茄炒蛋")]);
        let pollers = ImagePollerSet::new();
        let source: Arc<dyn ImageStatusSource> = store;

        pollers.start("temp-1-0", source, recipes.clone());
        wait_until_idle(&pollers).await;

        // Stopped by the ceiling, no panic, no merge.
        assert!(recipes.lock().unwrap()[0].image_url.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_prior_poller() {
        let store = Arc::new(ImageTaskStore::new());
        let recipes = shared(vec![recipe(0, "番茄炒蛋")]);
        let pollers = ImagePollerSet::new();
        let source: Arc<dyn ImageStatusSource> = store.clone();

        pollers.start("temp-1-0", source.clone(), recipes.clone());
        pollers.start("temp-1-0", source, recipes.clone());

        assert_eq!(pollers.active_count(), 1);
        pollers.stop_all();
        assert_eq!(pollers.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pollers_for_different_recipes_are_independent() {
        let store = Arc::new(ImageTaskStore::new());
        store.create("temp-1-0", "番茄炒蛋");
        store.complete("temp-1-0", "http://a".to_string());
        store.create("temp-1-1", "清炒时蔬");
        store.complete("temp-1-1", "http://b".to_string());

        let recipes = shared(vec![recipe(0, "番茄炒蛋"), recipe(1, "清炒时蔬")]);
        let pollers = ImagePollerSet::new();
        let source: Arc<dyn ImageStatusSource> = store;

        pollers.start_missing(&source, &recipes);
        assert_eq!(pollers.active_count(), 2);
        wait_until_idle(&pollers).await;

        let recipes = recipes.lock().unwrap();
        assert_eq!(recipes[0].image_url.as_deref(), Some("http://a"));
        assert_eq!(recipes[1].image_url.as_deref(), Some("http://b"));
    }
}
