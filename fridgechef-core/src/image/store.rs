//! In-memory registry of image generation tasks, keyed by recipe id.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Lifecycle state of an image generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ImageTaskStatus {
    Pending,
    Generating,
    Completed,
    Failed,
}

impl ImageTaskStatus {
    /// Terminal states see no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImageTaskStatus::Completed | ImageTaskStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageTaskStatus::Pending => "pending",
            ImageTaskStatus::Generating => "generating",
            ImageTaskStatus::Completed => "completed",
            ImageTaskStatus::Failed => "failed",
        }
    }
}

/// One image generation attempt tied to a single recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ImageTask {
    pub recipe_id: String,
    pub recipe_name: String,
    pub status: ImageTaskStatus,
    /// Present iff status is completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Present iff status is failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Process-wide registry of image tasks.
///
/// The store owns task records exclusively; only the worker mutates them.
/// Tasks live for the process lifetime unless removed by [`cleanup`].
///
/// [`cleanup`]: ImageTaskStore::cleanup
pub struct ImageTaskStore {
    tasks: Mutex<HashMap<String, ImageTask>>,
}

impl ImageTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Register a task in state pending, overwriting any prior task for the
    /// same recipe id.
    pub fn create(&self, recipe_id: &str, recipe_name: &str) {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.insert(
            recipe_id.to_string(),
            ImageTask {
                recipe_id: recipe_id.to_string(),
                recipe_name: recipe_name.to_string(),
                status: ImageTaskStatus::Pending,
                image_url: None,
                error: None,
            },
        );
    }

    pub fn get(&self, recipe_id: &str) -> Option<ImageTask> {
        self.tasks.lock().unwrap().get(recipe_id).cloned()
    }

    /// Look up several tasks at once; ids with no task are omitted.
    pub fn get_many(&self, recipe_ids: &[String]) -> HashMap<String, ImageTask> {
        let tasks = self.tasks.lock().unwrap();
        recipe_ids
            .iter()
            .filter_map(|id| tasks.get(id).map(|task| (id.clone(), task.clone())))
            .collect()
    }

    /// Remove every task currently in a terminal state, returning how many
    /// were removed. Callers invoke this opportunistically; the store never
    /// schedules it.
    pub fn cleanup(&self) -> usize {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|_, task| !task.status.is_terminal());
        let removed = before - tasks.len();

        if removed > 0 {
            tracing::info!(removed, "Cleaned up completed image generation tasks");
        }
        removed
    }

    /// Number of tasks currently registered.
    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn set_generating(&self, recipe_id: &str) {
        let mut tasks = self.tasks.lock().unwrap();
        if let Some(task) = tasks.get_mut(recipe_id) {
            task.status = ImageTaskStatus::Generating;
        }
    }

    pub(crate) fn complete(&self, recipe_id: &str, image_url: String) {
        let mut tasks = self.tasks.lock().unwrap();
        if let Some(task) = tasks.get_mut(recipe_id) {
            task.status = ImageTaskStatus::Completed;
            task.image_url = Some(image_url);
            task.error = None;
        }
    }

    pub(crate) fn fail(&self, recipe_id: &str, error: impl Into<String>) {
        let mut tasks = self.tasks.lock().unwrap();
        if let Some(task) = tasks.get_mut(recipe_id) {
            task.status = ImageTaskStatus::Failed;
            task.error = Some(error.into());
            task.image_url = None;
        }
    }
}

impl Default for ImageTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_registers_pending_task() {
        let store = ImageTaskStore::new();
        store.create("42", "番茄炒蛋");

        let task = store.get("42").unwrap();
        assert_eq!(task.status, ImageTaskStatus::Pending);
        assert_eq!(task.recipe_name, "番茄炒蛋");
        assert!(task.image_url.is_none());
        assert!(task.error.is_none());
    }

    #[test]
    fn test_create_overwrites_prior_task() {
        let store = ImageTaskStore::new();
        store.create("42", "番茄炒蛋");
        store.complete("42", "http://x".to_string());

        store.create("42", "清炒时蔬");
        let task = store.get("42").unwrap();
        assert_eq!(task.status, ImageTaskStatus::Pending);
        assert_eq!(task.recipe_name, "清炒时蔬");
        assert!(task.image_url.is_none());
    }

    #[test]
    fn test_get_many_omits_missing_ids() {
        let store = ImageTaskStore::new();
        store.create("1", "a");
        store.create("2", "b");

        let ids = vec!["1".to_string(), "3".to_string()];
        let found = store.get_many(&ids);
        assert_eq!(found.len(), 1);
        assert!(found.contains_key("1"));
        assert!(!found.contains_key("3"));
    }

    #[test]
    fn test_cleanup_removes_exactly_terminal_tasks() {
        let store = ImageTaskStore::new();
        store.create("pending", "a");
        store.create("done", "b");
        store.create("broken", "c");
        store.complete("done", "http://x".to_string());
        store.fail("broken", "boom");

        let removed = store.cleanup();
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert!(store.get("pending").is_some());
        assert!(store.get("done").is_none());
        assert!(store.get("broken").is_none());
    }

    #[test]
    fn test_fail_then_complete_round_trip_clears_fields() {
        let store = ImageTaskStore::new();
        store.create("42", "番茄炒蛋");
        store.fail("42", "boom");
        assert_eq!(store.get("42").unwrap().error.as_deref(), Some("boom"));

        store.complete("42", "http://x".to_string());
        let task = store.get("42").unwrap();
        assert_eq!(task.status, ImageTaskStatus::Completed);
        assert_eq!(task.image_url.as_deref(), Some("http://x"));
        assert!(task.error.is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ImageTaskStatus::Pending.is_terminal());
        assert!(!ImageTaskStatus::Generating.is_terminal());
        assert!(ImageTaskStatus::Completed.is_terminal());
        assert!(ImageTaskStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ImageTaskStatus::Generating).unwrap();
        assert_eq!(json, "\"generating\"");
    }
}
