pub mod status;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/images endpoints (mounted at /api/images)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status/batch", post(status::get_batch_image_status))
        .route("/status/{recipe_id}", get(status::get_image_status))
}

#[derive(OpenApi)]
#[openapi(
    paths(status::get_image_status, status::get_batch_image_status),
    components(schemas(
        status::BatchStatusRequest,
        status::BatchStatusResponse,
        status::ImageStatusEntry,
        fridgechef_core::ImageTask,
    ))
)]
pub struct ApiDoc;
