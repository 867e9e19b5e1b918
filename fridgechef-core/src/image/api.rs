//! Text-to-image synthesis API client.
//!
//! The external service runs jobs asynchronously: a submission returns a
//! task id, and the job is then polled until it reports a terminal status.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default image synthesis model.
pub const DEFAULT_IMAGE_MODEL: &str = "wan2.2-t2i-flash";

/// Default Dashscope API base URL.
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://dashscope.aliyuncs.com/api/v1";

const IMAGE_SIZE: &str = "1024*1024";

/// Error type for image API operations.
#[derive(Debug, Error)]
pub enum ImageApiError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Status reported by the image service for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageJobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    /// Any status string this client does not recognize. Treated as
    /// inconclusive by the worker.
    Unknown,
}

impl ImageJobStatus {
    fn from_api(status: &str) -> Self {
        match status {
            "PENDING" => ImageJobStatus::Pending,
            "RUNNING" => ImageJobStatus::Running,
            "SUCCEEDED" => ImageJobStatus::Succeeded,
            "FAILED" => ImageJobStatus::Failed,
            _ => ImageJobStatus::Unknown,
        }
    }
}

/// One poll of an image job.
#[derive(Debug, Clone)]
pub struct ImageJobPoll {
    pub status: ImageJobStatus,
    /// First result URL, when the job succeeded.
    pub image_url: Option<String>,
    /// Failure message, when the job failed.
    pub message: Option<String>,
}

impl ImageJobPoll {
    pub fn pending() -> Self {
        Self {
            status: ImageJobStatus::Pending,
            image_url: None,
            message: None,
        }
    }

    pub fn running() -> Self {
        Self {
            status: ImageJobStatus::Running,
            image_url: None,
            message: None,
        }
    }

    pub fn succeeded(url: impl Into<String>) -> Self {
        Self {
            status: ImageJobStatus::Succeeded,
            image_url: Some(url.into()),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: ImageJobStatus::Failed,
            image_url: None,
            message: Some(message.into()),
        }
    }
}

/// Trait for asynchronous image synthesis services, enabling mockability
/// in tests.
#[async_trait]
pub trait ImageSynthesisApi: Send + Sync {
    /// Submit a generation job. Returns the job's task id, or `None` when
    /// the service accepted the request without returning one.
    async fn submit(
        &self,
        prompt: &str,
        negative_prompt: &str,
    ) -> Result<Option<String>, ImageApiError>;

    /// Query a previously submitted job.
    async fn query(&self, task_id: &str) -> Result<ImageJobPoll, ImageApiError>;
}

/// Dashscope asynchronous text-to-image client.
pub struct DashscopeImageApi {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl DashscopeImageApi {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: DEFAULT_IMAGE_MODEL.to_string(),
            base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from `DASHSCOPE_API_KEY`.
    pub fn from_env() -> Result<Self, ImageApiError> {
        let api_key = std::env::var("DASHSCOPE_API_KEY").map_err(|_| {
            ImageApiError::RequestFailed("DASHSCOPE_API_KEY not set".to_string())
        })?;
        Ok(Self::new(api_key))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    model: &'a str,
    input: SubmitInput<'a>,
    parameters: SubmitParameters<'a>,
}

#[derive(Debug, Serialize)]
struct SubmitInput<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
}

#[derive(Debug, Serialize)]
struct SubmitParameters<'a> {
    size: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    output: Option<SubmitOutput>,
}

#[derive(Debug, Deserialize)]
struct SubmitOutput {
    task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    output: Option<QueryOutput>,
}

#[derive(Debug, Deserialize)]
struct QueryOutput {
    task_status: Option<String>,
    #[serde(default)]
    results: Vec<QueryResult>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    url: Option<String>,
}

#[async_trait]
impl ImageSynthesisApi for DashscopeImageApi {
    async fn submit(
        &self,
        prompt: &str,
        negative_prompt: &str,
    ) -> Result<Option<String>, ImageApiError> {
        let request = SubmitRequest {
            model: &self.model,
            input: SubmitInput {
                prompt,
                negative_prompt,
            },
            parameters: SubmitParameters {
                size: IMAGE_SIZE,
                n: 1,
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/services/aigc/text2image/image-synthesis",
                self.base_url
            ))
            .header("X-DashScope-Async", "enable")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ImageApiError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ImageApiError::RequestFailed(e.to_string()))?;

        if status != 200 {
            return Err(ImageApiError::ApiError {
                status,
                message: body,
            });
        }

        let response: SubmitResponse =
            serde_json::from_str(&body).map_err(|e| ImageApiError::ParseError(e.to_string()))?;

        Ok(response.output.and_then(|output| output.task_id))
    }

    async fn query(&self, task_id: &str) -> Result<ImageJobPoll, ImageApiError> {
        let response = self
            .client
            .get(format!("{}/tasks/{}", self.base_url, task_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ImageApiError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ImageApiError::RequestFailed(e.to_string()))?;

        if status != 200 {
            return Err(ImageApiError::ApiError {
                status,
                message: body,
            });
        }

        let response: QueryResponse =
            serde_json::from_str(&body).map_err(|e| ImageApiError::ParseError(e.to_string()))?;

        let Some(output) = response.output else {
            return Ok(ImageJobPoll {
                status: ImageJobStatus::Unknown,
                image_url: None,
                message: None,
            });
        };

        let job_status = output
            .task_status
            .as_deref()
            .map_or(ImageJobStatus::Unknown, ImageJobStatus::from_api);

        Ok(ImageJobPoll {
            status: job_status,
            image_url: output.results.into_iter().find_map(|result| result.url),
            message: output.message,
        })
    }
}

/// Scripted image API for testing.
///
/// Submission results are consumed in order; polls are consumed per task id.
/// An exhausted poll queue keeps reporting a pending job, which models a
/// job that never reaches a terminal status.
pub struct MockImageApi {
    submits: Mutex<VecDeque<Result<Option<String>, String>>>,
    polls: Mutex<HashMap<String, VecDeque<ImageJobPoll>>>,
    submit_calls: AtomicUsize,
    query_calls: AtomicUsize,
}

impl MockImageApi {
    pub fn new() -> Self {
        Self {
            submits: Mutex::new(VecDeque::new()),
            polls: Mutex::new(HashMap::new()),
            submit_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
        }
    }

    /// Script a successful submission returning the given task id.
    pub fn with_submit(self, task_id: &str) -> Self {
        self.submits
            .lock()
            .unwrap()
            .push_back(Ok(Some(task_id.to_string())));
        self
    }

    /// Script a submission that is accepted but returns no task id.
    pub fn with_submit_missing_task_id(self) -> Self {
        self.submits.lock().unwrap().push_back(Ok(None));
        self
    }

    /// Script a failing submission.
    pub fn with_submit_error(self, message: &str) -> Self {
        self.submits
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    /// Script the next poll result for a task id.
    pub fn with_poll(self, task_id: &str, poll: ImageJobPoll) -> Self {
        self.polls
            .lock()
            .unwrap()
            .entry(task_id.to_string())
            .or_default()
            .push_back(poll);
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockImageApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageSynthesisApi for MockImageApi {
    async fn submit(
        &self,
        _prompt: &str,
        _negative_prompt: &str,
    ) -> Result<Option<String>, ImageApiError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        match self.submits.lock().unwrap().pop_front() {
            Some(Ok(task_id)) => Ok(task_id),
            Some(Err(message)) => Err(ImageApiError::RequestFailed(message)),
            None => Err(ImageApiError::RequestFailed(
                "No scripted submit response".to_string(),
            )),
        }
    }

    async fn query(&self, task_id: &str) -> Result<ImageJobPoll, ImageApiError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        let mut polls = self.polls.lock().unwrap();
        let poll = polls
            .get_mut(task_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(ImageJobPoll::pending);
        Ok(poll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_mapping() {
        assert_eq!(ImageJobStatus::from_api("PENDING"), ImageJobStatus::Pending);
        assert_eq!(ImageJobStatus::from_api("RUNNING"), ImageJobStatus::Running);
        assert_eq!(
            ImageJobStatus::from_api("SUCCEEDED"),
            ImageJobStatus::Succeeded
        );
        assert_eq!(ImageJobStatus::from_api("FAILED"), ImageJobStatus::Failed);
        assert_eq!(ImageJobStatus::from_api("CANCELED"), ImageJobStatus::Unknown);
    }

    #[test]
    fn test_query_response_parses_success_shape() {
        let body = r#"{"output":{"task_status":"SUCCEEDED","results":[{"url":"http://x"}]}}"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        let output = parsed.output.unwrap();
        assert_eq!(output.task_status.as_deref(), Some("SUCCEEDED"));
        assert_eq!(output.results[0].url.as_deref(), Some("http://x"));
    }

    #[test]
    fn test_submit_response_tolerates_missing_task_id() {
        let parsed: SubmitResponse = serde_json::from_str(r#"{"output":{}}"#).unwrap();
        assert!(parsed.output.unwrap().task_id.is_none());
    }

    #[tokio::test]
    async fn test_mock_consumes_scripted_responses_in_order() {
        let api = MockImageApi::new()
            .with_submit("task-1")
            .with_poll("task-1", ImageJobPoll::running())
            .with_poll("task-1", ImageJobPoll::succeeded("http://x"));

        assert_eq!(api.submit("p", "n").await.unwrap().as_deref(), Some("task-1"));
        assert_eq!(
            api.query("task-1").await.unwrap().status,
            ImageJobStatus::Running
        );
        assert_eq!(
            api.query("task-1").await.unwrap().image_url.as_deref(),
            Some("http://x")
        );
        // Exhausted queue reports a job that never finishes.
        assert_eq!(
            api.query("task-1").await.unwrap().status,
            ImageJobStatus::Pending
        );
        assert_eq!(api.query_calls(), 3);
    }
}
