//! Parsing and validation of raw model output into recipe payloads.

use serde_json::Value;

use crate::error::GenerationError;
use crate::types::RecipePayload;

/// Strip a wrapping markdown code fence (```json ... ``` or ``` ... ```)
/// if present, returning the inner text.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (e.g. "json") up to the end of the opening line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };

    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

/// Structural validity predicate for one raw recipe element.
///
/// Elements failing this are dropped, not fatal.
fn is_structurally_valid(value: &Value) -> bool {
    let name_ok = value
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.trim().is_empty());

    let cuisine_ok = value.get("cuisine").is_some_and(Value::is_number);
    let time_ok = value
        .get("cookingTimeMinutes")
        .is_some_and(Value::is_number);
    let difficulty_ok = value.get("difficulty").is_some_and(Value::is_number);

    let ingredients_ok = value.get("ingredients").is_some_and(|ingredients| {
        ingredients
            .get("available")
            .is_some_and(Value::is_array)
            && ingredients.get("needed").is_some_and(Value::is_array)
    });

    let steps_ok = value
        .get("steps")
        .and_then(Value::as_array)
        .is_some_and(|steps| !steps.is_empty());

    name_ok && cuisine_ok && time_ok && difficulty_ok && ingredients_ok && steps_ok
}

/// Parse raw model text into validated recipe payloads.
///
/// The text must be a JSON array (optionally fenced); a non-array or
/// unparseable body is a fatal error for the generation attempt. Individual
/// elements failing the structural predicate are dropped and logged. An
/// empty result after filtering is also fatal: the caller never gets an
/// empty success.
pub fn parse_recipes(raw: &str) -> Result<Vec<RecipePayload>, GenerationError> {
    let body = strip_code_fences(raw);

    let elements: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

    let total = elements.len();
    let mut recipes = Vec::with_capacity(total);

    for element in elements {
        if !is_structurally_valid(&element) {
            tracing::warn!(
                name = element.get("name").and_then(serde_json::Value::as_str).unwrap_or(""),
                "Dropping structurally invalid recipe entry"
            );
            continue;
        }

        match serde_json::from_value::<RecipePayload>(element) {
            Ok(recipe) => recipes.push(recipe),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping recipe entry that failed to deserialize");
            }
        }
    }

    if recipes.is_empty() {
        tracing::warn!(total, "No valid recipes in model response");
        return Err(GenerationError::NoValidRecipes);
    }

    if recipes.len() < total {
        tracing::debug!(
            kept = recipes.len(),
            dropped = total - recipes.len(),
            "Filtered invalid recipe entries"
        );
    }

    Ok(recipes)
}
