use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::labels;

/// One ingredient with quantity and unit, as it appears in generated recipes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IngredientItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

/// The split between ingredients the user already has and ingredients
/// they still need to buy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecipeIngredients {
    pub available: Vec<IngredientItem>,
    pub needed: Vec<IngredientItem>,
}

/// Estimated per-serving nutrition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NutritionAnalysis {
    /// Kilocalories per serving.
    pub calories: f64,
    /// Protein in grams.
    pub protein: f64,
    /// Carbohydrates in grams.
    pub carbs: f64,
    /// Fat in grams.
    pub fat: f64,
}

/// Optional constraints on recipe generation. An absent field means
/// "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecipeFilters {
    /// Cuisine code (1-4).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<i32>,
    /// Taste base codes (1-6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taste_base: Option<Vec<i32>>,
    /// Spice level code (0-4).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spice_level: Option<i32>,
    /// Maximum cooking time in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cooking_time: Option<u32>,
    /// Difficulty code (1-3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<i32>,
}

impl RecipeFilters {
    /// True when no field constrains the generation.
    pub fn is_empty(&self) -> bool {
        self.cuisine.is_none()
            && self.taste_base.as_ref().map_or(true, |t| t.is_empty())
            && self.spice_level.is_none()
            && self.max_cooking_time.is_none()
            && self.difficulty.is_none()
    }
}

/// A recipe as validated from raw model output, before display names and
/// identifiers are attached. This is the shape stored in the generation cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecipePayload {
    pub name: String,
    /// Cuisine code (1-4).
    pub cuisine: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taste_base: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spice_level: Option<i32>,
    pub cooking_time_minutes: u32,
    /// Difficulty code (1-3).
    pub difficulty: i32,
    pub ingredients: RecipeIngredients,
    /// Preparation steps, at least one.
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition_analysis: Option<NutritionAnalysis>,
}

/// Recipe identifier: a temporary string id before persistence, a durable
/// integer id once saved by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum RecipeId {
    Durable(i64),
    Temp(String),
}

impl RecipeId {
    /// Temporary id in the `temp-{millis}-{index}` format used before a
    /// recipe is persisted.
    pub fn temp(millis: i64, index: usize) -> Self {
        RecipeId::Temp(format!("temp-{}-{}", millis, index))
    }

    pub fn is_durable(&self) -> bool {
        matches!(self, RecipeId::Durable(_))
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeId::Durable(id) => write!(f, "{}", id),
            RecipeId::Temp(id) => write!(f, "{}", id),
        }
    }
}

/// A fully shaped recipe as returned to callers: coded attributes plus their
/// display names, an identifier, and an image URL once generation completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GeneratedRecipe {
    pub id: RecipeId,
    pub name: String,
    pub cuisine: i32,
    pub cuisine_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taste_base: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taste_base_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spice_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spice_level_name: Option<String>,
    pub cooking_time_minutes: u32,
    pub difficulty: i32,
    pub difficulty_name: String,
    /// Absent until the image generation task for this recipe completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub ingredients: RecipeIngredients,
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition_analysis: Option<NutritionAnalysis>,
    pub ai_generated: bool,
    pub created_at: DateTime<Utc>,
}

impl GeneratedRecipe {
    /// Shape a validated payload into a returned recipe, deriving display
    /// names from the canonical label tables.
    pub fn from_payload(payload: RecipePayload, id: RecipeId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            cuisine_name: labels::cuisine_label(payload.cuisine).to_string(),
            taste_base_name: payload
                .taste_base
                .map(|code| labels::taste_base_label(code).to_string()),
            spice_level_name: payload
                .spice_level
                .map(|code| labels::spice_level_label(code).to_string()),
            difficulty_name: labels::difficulty_label(payload.difficulty).to_string(),
            name: payload.name,
            cuisine: payload.cuisine,
            taste_base: payload.taste_base,
            spice_level: payload.spice_level,
            cooking_time_minutes: payload.cooking_time_minutes,
            difficulty: payload.difficulty,
            image_url: None,
            ingredients: payload.ingredients,
            steps: payload.steps,
            nutrition_analysis: payload.nutrition_analysis,
            ai_generated: true,
            created_at,
        }
    }

    /// Names of the available ingredients, used for image prompts.
    pub fn available_ingredient_names(&self) -> Vec<String> {
        self.ingredients
            .available
            .iter()
            .map(|item| item.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> RecipePayload {
        RecipePayload {
            name: "番茄炒蛋".to_string(),
            cuisine: 1,
            taste_base: Some(2),
            spice_level: Some(0),
            cooking_time_minutes: 15,
            difficulty: 1,
            ingredients: RecipeIngredients {
                available: vec![IngredientItem {
                    name: "番茄".to_string(),
                    quantity: 2.0,
                    unit: "个".to_string(),
                }],
                needed: vec![],
            },
            steps: vec!["番茄切块，鸡蛋打散".to_string()],
            nutrition_analysis: None,
        }
    }

    #[test]
    fn test_from_payload_derives_names() {
        let recipe =
            GeneratedRecipe::from_payload(payload(), RecipeId::temp(1700000000000, 0), Utc::now());

        assert_eq!(recipe.id, RecipeId::Temp("temp-1700000000000-0".to_string()));
        assert_eq!(recipe.cuisine_name, "中餐");
        assert_eq!(recipe.taste_base_name.as_deref(), Some("甜"));
        // Spice level 0 still gets a display name.
        assert_eq!(recipe.spice_level_name.as_deref(), Some("不辣"));
        assert_eq!(recipe.difficulty_name, "简单");
        assert!(recipe.image_url.is_none());
        assert!(recipe.ai_generated);
    }

    #[test]
    fn test_from_payload_omits_names_for_absent_codes() {
        let mut p = payload();
        p.taste_base = None;
        p.spice_level = None;
        let recipe = GeneratedRecipe::from_payload(p, RecipeId::Durable(42), Utc::now());

        assert!(recipe.taste_base_name.is_none());
        assert!(recipe.spice_level_name.is_none());
        assert!(recipe.id.is_durable());
    }

    #[test]
    fn test_recipe_id_serialization() {
        assert_eq!(
            serde_json::to_string(&RecipeId::Durable(7)).unwrap(),
            "7"
        );
        assert_eq!(
            serde_json::to_string(&RecipeId::Temp("temp-1-0".to_string())).unwrap(),
            "\"temp-1-0\""
        );
    }

    #[test]
    fn test_filters_is_empty() {
        assert!(RecipeFilters::default().is_empty());
        assert!(RecipeFilters {
            taste_base: Some(vec![]),
            ..Default::default()
        }
        .is_empty());
        assert!(!RecipeFilters {
            cuisine: Some(1),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_payload_uses_camel_case_wire_names() {
        let json = serde_json::to_value(payload()).unwrap();
        assert!(json.get("cookingTimeMinutes").is_some());
        assert!(json.get("tasteBase").is_some());
        assert!(json.get("cooking_time_minutes").is_none());
    }
}
