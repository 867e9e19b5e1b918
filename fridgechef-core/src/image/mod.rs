//! Asynchronous recipe image generation.
//!
//! A recipe's image is produced by an external text-to-image service whose
//! jobs are submitted and polled asynchronously. The pieces here:
//!
//! - [`ImageTaskStore`]: in-memory registry of per-recipe task state
//! - [`ImageWorker`]: submits jobs, polls them, and updates the store,
//!   detached from the request that triggered generation
//! - [`ImagePollerSet`]: the client-side polling loops that watch task
//!   status until an image arrives or the poller times out

mod api;
mod poller;
mod store;
mod worker;

pub use api::{
    DashscopeImageApi, ImageApiError, ImageJobPoll, ImageJobStatus, ImageSynthesisApi,
    MockImageApi,
};
pub use poller::{HttpImageStatusSource, ImagePollerSet, ImageStatusSource, SharedRecipes};
pub use store::{ImageTask, ImageTaskStatus, ImageTaskStore};
pub use worker::{render_image_prompt, GenerationOutcome, ImageWorker};
