//! Image generation worker: submits jobs, polls to completion, updates the
//! task store. Runs detached from the request that triggered it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use super::api::{ImageApiError, ImageJobStatus, ImageSynthesisApi};
use super::store::ImageTaskStore;
use crate::types::GeneratedRecipe;

/// Delay between job polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Maximum polls per job before giving up (20 x 3s = 60s).
pub const MAX_POLL_ATTEMPTS: u32 = 20;

/// How many generation procedures run concurrently within a batch.
pub const BATCH_SIZE: usize = 3;

/// Fixed negative prompt for all image jobs.
pub const NEGATIVE_PROMPT: &str = "低质量，模糊，变形，不真实";

/// Build the image prompt from the recipe name and up to 3 ingredient names.
pub fn render_image_prompt(recipe_name: &str, ingredients: &[String]) -> String {
    let ingredient_list = ingredients
        .iter()
        .take(3)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("、");

    format!(
        "一道精美的{recipe_name}美食摄影，主要食材包括{ingredient_list}，菜品摆盘精致，色彩鲜艳，光线柔和，背景简洁，专业美食摄影风格，高清画质，食欲感强"
    )
}

/// How one generation procedure ended.
///
/// `TimedOut` is deliberate: the task record stays in `generating` when the
/// poll budget runs out, and only the worker-side outcome names the timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Completed,
    Failed,
    TimedOut,
}

#[derive(Clone)]
struct GenerationJob {
    recipe_id: String,
    recipe_name: String,
    ingredients: Vec<String>,
}

impl GenerationJob {
    fn for_recipe(recipe: &GeneratedRecipe) -> Self {
        Self {
            recipe_id: recipe.id.to_string(),
            recipe_name: recipe.name.clone(),
            ingredients: recipe.available_ingredient_names(),
        }
    }
}

/// Drives image generation tasks against an [`ImageSynthesisApi`], recording
/// progress in an [`ImageTaskStore`].
#[derive(Clone)]
pub struct ImageWorker {
    api: Arc<dyn ImageSynthesisApi>,
    store: Arc<ImageTaskStore>,
}

impl ImageWorker {
    pub fn new(api: Arc<dyn ImageSynthesisApi>, store: Arc<ImageTaskStore>) -> Self {
        Self { api, store }
    }

    pub fn store(&self) -> &Arc<ImageTaskStore> {
        &self.store
    }

    /// Register tasks for a batch of recipes and run generation in the
    /// background. Returns immediately; failures are recorded in the store
    /// and logged, never surfaced to the caller.
    pub fn start_batch(&self, recipes: &[GeneratedRecipe]) {
        let jobs: Vec<GenerationJob> = recipes.iter().map(GenerationJob::for_recipe).collect();

        // Tasks become visible as pending before any background work starts.
        for job in &jobs {
            self.store.create(&job.recipe_id, &job.recipe_name);
        }

        let worker = self.clone();
        tokio::spawn(async move {
            worker.run_batch(jobs).await;
        });
    }

    /// Register and run a single recipe's generation in the background.
    pub fn start_generation(&self, recipe_id: &str, recipe_name: &str, ingredients: Vec<String>) {
        self.store.create(recipe_id, recipe_name);

        let worker = self.clone();
        let job = GenerationJob {
            recipe_id: recipe_id.to_string(),
            recipe_name: recipe_name.to_string(),
            ingredients,
        };
        tokio::spawn(async move {
            worker.run_generation(job).await;
        });
    }

    /// Run jobs in batches of [`BATCH_SIZE`]: each batch's procedures run
    /// concurrently, and all settle before the next batch starts.
    async fn run_batch(&self, jobs: Vec<GenerationJob>) {
        for chunk in jobs.chunks(BATCH_SIZE) {
            let mut set = JoinSet::new();
            for job in chunk {
                let worker = self.clone();
                let job = job.clone();
                set.spawn(async move { worker.run_generation(job).await });
            }
            while let Some(result) = set.join_next().await {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Image generation task panicked");
                }
            }
        }
    }

    async fn run_generation(&self, job: GenerationJob) -> GenerationOutcome {
        self.store.set_generating(&job.recipe_id);

        let prompt = render_image_prompt(&job.recipe_name, &job.ingredients);
        tracing::info!(
            recipe_id = %job.recipe_id,
            recipe_name = %job.recipe_name,
            "Submitting image generation job"
        );

        let task_id = match self.api.submit(&prompt, NEGATIVE_PROMPT).await {
            Ok(Some(task_id)) => task_id,
            Ok(None) => {
                tracing::warn!(recipe_id = %job.recipe_id, "No task ID in submission response");
                self.store
                    .fail(&job.recipe_id, "No task ID in submission response");
                return GenerationOutcome::Failed;
            }
            Err(e) => {
                tracing::warn!(recipe_id = %job.recipe_id, error = %e, "Image job submission failed");
                self.store.fail(&job.recipe_id, e.to_string());
                return GenerationOutcome::Failed;
            }
        };

        tracing::info!(recipe_id = %job.recipe_id, task_id = %task_id, "Image job submitted");
        self.poll_job(&job, &task_id).await
    }

    async fn poll_job(&self, job: &GenerationJob, task_id: &str) -> GenerationOutcome {
        for attempt in 1..=MAX_POLL_ATTEMPTS {
            tokio::time::sleep(POLL_INTERVAL).await;

            let poll = match self.api.query(task_id).await {
                Ok(poll) => poll,
                Err(e) => {
                    // Inconclusive; keep polling within the attempt budget.
                    log_inconclusive_poll(job, task_id, attempt, &e);
                    continue;
                }
            };

            match poll.status {
                ImageJobStatus::Succeeded => {
                    if let Some(url) = poll.image_url {
                        tracing::info!(
                            recipe_id = %job.recipe_id,
                            image_url = %url,
                            "Image generation completed"
                        );
                        self.store.complete(&job.recipe_id, url);
                        return GenerationOutcome::Completed;
                    }
                    // Succeeded without results; keep polling.
                    tracing::warn!(
                        recipe_id = %job.recipe_id,
                        task_id = %task_id,
                        "Image job succeeded without results"
                    );
                }
                ImageJobStatus::Failed => {
                    let message = poll.message.unwrap_or_else(|| "Unknown error".to_string());
                    tracing::warn!(
                        recipe_id = %job.recipe_id,
                        error = %message,
                        "Image generation failed"
                    );
                    self.store.fail(&job.recipe_id, message);
                    return GenerationOutcome::Failed;
                }
                ImageJobStatus::Pending | ImageJobStatus::Running => {
                    tracing::debug!(
                        recipe_id = %job.recipe_id,
                        attempt,
                        "Image job still in progress"
                    );
                }
                ImageJobStatus::Unknown => {
                    tracing::warn!(
                        recipe_id = %job.recipe_id,
                        task_id = %task_id,
                        attempt,
                        "Unrecognized image job status"
                    );
                }
            }
        }

        // Poll budget exhausted: the task record stays in generating.
        tracing::warn!(
            recipe_id = %job.recipe_id,
            recipe_name = %job.recipe_name,
            "Image generation timed out, task left in generating state"
        );
        GenerationOutcome::TimedOut
    }
}

fn log_inconclusive_poll(job: &GenerationJob, task_id: &str, attempt: u32, error: &ImageApiError) {
    tracing::warn!(
        recipe_id = %job.recipe_id,
        task_id = %task_id,
        attempt,
        error = %error,
        "Image job poll failed, will retry"
    );
}
