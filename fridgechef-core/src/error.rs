use thiserror::Error;

/// Errors from the recipe generation pipeline.
///
/// All variants are hard failures: the caller gets no recipes and no
/// fallback data.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("LLM error: {0}")]
    Llm(#[from] crate::llm::LlmError),

    #[error("Failed to parse model response: {0}")]
    InvalidResponse(String),

    #[error("No valid recipes generated")]
    NoValidRecipes,
}
