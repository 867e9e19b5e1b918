use crate::api::ErrorResponse;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use fridgechef_core::{GeneratedRecipe, RecipeFilters};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GenerateRecipesRequest {
    /// Ingredients the user has available
    pub ingredients: Vec<String>,
    /// Optional generation constraints
    #[serde(default)]
    pub filters: Option<RecipeFilters>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenerateRecipesResponse {
    pub recipes: Vec<GeneratedRecipe>,
}

#[utoipa::path(
    post,
    path = "/api/recipes/generate",
    tag = "recipes",
    request_body = GenerateRecipesRequest,
    responses(
        (status = 200, description = "Recipes generated", body = GenerateRecipesResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 502, description = "Generation failed", body = ErrorResponse)
    )
)]
pub async fn generate_recipes(
    State(state): State<AppState>,
    Json(request): Json<GenerateRecipesRequest>,
) -> impl IntoResponse {
    // Input validation happens here, before the generation core.
    if request.ingredients.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Ingredient list must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    if request.ingredients.iter().any(|name| name.trim().is_empty()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Ingredient names must not be blank".to_string(),
            }),
        )
            .into_response();
    }

    match state
        .workflow
        .generate_recipes(&request.ingredients, request.filters.as_ref())
        .await
    {
        Ok(recipes) => (StatusCode::OK, Json(GenerateRecipesResponse { recipes })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Recipe generation failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
