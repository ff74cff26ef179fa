use async_trait::async_trait;

use crate::error::Result;
use crate::models::Turn;

/// Turns text into fixed-length vectors. Identical input must give identical
/// output for the lifetime of the process.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>>;

    async fn embed_passages(&self, passages: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

/// Everything the generative model sees for one answer.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub context: Vec<String>,
    pub history: Vec<Turn>,
    pub message: String,
}

/// Produces an answer from context and conversation history.
///
/// A failed call is an `Err`. `Ok` with empty text is a successful call that
/// produced nothing; the caller decides what to do with it.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
