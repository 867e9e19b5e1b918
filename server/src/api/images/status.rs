use crate::api::ErrorResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use fridgechef_core::ImageTask;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[utoipa::path(
    get,
    path = "/api/images/status/{recipe_id}",
    tag = "images",
    params(
        ("recipe_id" = String, Path, description = "Recipe ID the task was created for")
    ),
    responses(
        (status = 200, description = "Image task status", body = ImageTask),
        (status = 404, description = "No task for this recipe", body = ErrorResponse)
    )
)]
pub async fn get_image_status(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> impl IntoResponse {
    match state.tasks.get(&recipe_id) {
        Some(task) => (StatusCode::OK, Json(task)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Image generation task not found".to_string(),
            }),
        )
            .into_response(),
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatusRequest {
    /// Recipe IDs to query
    pub recipe_ids: Vec<String>,
}

/// Per-recipe status entry. Unknown recipe ids get status `not_found`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageStatusEntry {
    pub recipe_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_name: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImageStatusEntry {
    fn found(task: ImageTask) -> Self {
        Self {
            recipe_id: task.recipe_id,
            recipe_name: Some(task.recipe_name),
            status: task.status.as_str().to_string(),
            image_url: task.image_url,
            error: task.error,
        }
    }

    fn not_found(recipe_id: String) -> Self {
        Self {
            recipe_id,
            recipe_name: None,
            status: "not_found".to_string(),
            image_url: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchStatusResponse {
    pub statuses: Vec<ImageStatusEntry>,
}

#[utoipa::path(
    post,
    path = "/api/images/status/batch",
    tag = "images",
    request_body = BatchStatusRequest,
    responses(
        (status = 200, description = "Per-recipe task statuses", body = BatchStatusResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn get_batch_image_status(
    State(state): State<AppState>,
    Json(request): Json<BatchStatusRequest>,
) -> impl IntoResponse {
    if request.recipe_ids.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Recipe ID list must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    let mut found = state.tasks.get_many(&request.recipe_ids);

    let statuses: Vec<ImageStatusEntry> = request
        .recipe_ids
        .iter()
        .map(|recipe_id| match found.remove(recipe_id) {
            Some(task) => ImageStatusEntry::found(task),
            None => ImageStatusEntry::not_found(recipe_id.clone()),
        })
        .collect();

    (StatusCode::OK, Json(BatchStatusResponse { statuses })).into_response()
}
