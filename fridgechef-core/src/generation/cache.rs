//! In-memory recipe generation cache with a fixed TTL.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::{RecipeFilters, RecipePayload};

/// How long a cached generation stays usable.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Derive the cache key for a generation request.
///
/// The ingredient list is sorted so ingredient order does not fragment the
/// cache; filters are serialized as-is, with absent/empty filters mapping to
/// the empty string.
pub fn cache_key(ingredients: &[String], filters: Option<&RecipeFilters>) -> String {
    let mut sorted: Vec<&str> = ingredients.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let filters_part = match filters {
        Some(filters) if !filters.is_empty() => {
            serde_json::to_string(filters).unwrap_or_default()
        }
        _ => String::new(),
    };

    format!("{}|{}", sorted.join(","), filters_part)
}

struct CacheEntry {
    recipes: Vec<RecipePayload>,
    created_at: Instant,
}

/// Process-lifetime cache of generated recipe sets.
///
/// Entries expire at read time; there is no background sweep, and growth is
/// unbounded by key cardinality. Construct one per application (or per test)
/// and pass it to the generator.
pub struct RecipeCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl RecipeCache {
    /// Create a cache with the standard 5-minute TTL.
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    /// Create a cache with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Get the cached recipe set for a key, treating expired entries as
    /// absent. Callers cannot distinguish "absent" from "expired".
    pub fn get(&self, key: &str) -> Option<Vec<RecipePayload>> {
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(key)?;

        if entry.created_at.elapsed() < self.ttl {
            tracing::debug!(key, "recipe cache hit");
            Some(entry.recipes.clone())
        } else {
            tracing::debug!(key, "recipe cache entry expired");
            None
        }
    }

    /// Store a recipe set, unconditionally overwriting any existing entry
    /// for the key.
    pub fn put(&self, key: String, recipes: Vec<RecipePayload>) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key,
            CacheEntry {
                recipes,
                created_at: Instant::now(),
            },
        );
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecipeCache {
    fn default() -> Self {
        Self::new()
    }
}
