use std::sync::{Arc, RwLock};

use crate::error::{DocentError, Result};
use crate::models::{Chunk, ScoredChunk};

use super::similarity::{cosine_with_norms, l2_norm};

pub const DEFAULT_TOP_K: usize = 3;

struct IndexedChunk {
    chunk: Arc<Chunk>,
    embedding: Vec<f32>,
    norm: f32,
}

#[derive(Default)]
struct IndexSnapshot {
    entries: Vec<IndexedChunk>,
    dimensions: usize,
}

/// Brute-force in-memory vector index over the knowledge chunks.
///
/// Rebuilding swaps in a fully built snapshot under a short write lock, so a
/// concurrent query ranks against either the previous corpus or the new one.
#[derive(Default)]
pub struct VectorIndex {
    snapshot: RwLock<Arc<IndexSnapshot>>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the index contents. Chunks and embeddings pair up by position.
    pub fn index(&self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(DocentError::InvalidArgument(format!(
                "Got {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        if let Some(pos) = embeddings.iter().position(|e| e.len() != dimensions) {
            return Err(DocentError::InvalidArgument(format!(
                "Embedding for chunk '{}' has {} dimensions, expected {dimensions}",
                chunks[pos].id,
                embeddings[pos].len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk {
                norm: l2_norm(&embedding),
                chunk: Arc::new(chunk),
                embedding,
            })
            .collect::<Vec<_>>();

        let next = Arc::new(IndexSnapshot {
            entries,
            dimensions,
        });
        let count = next.entries.len();
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = next;

        tracing::info!(chunks = count, dimensions, "Vector index rebuilt");
        Ok(())
    }

    /// Top `k` chunks by descending cosine similarity; equal scores keep corpus order.
    pub fn query(&self, query_embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(DocentError::InvalidArgument(
                "k must be greater than 0".to_string(),
            ));
        }

        let snapshot = self.current();
        if snapshot.entries.is_empty() {
            return Ok(Vec::new());
        }
        if query_embedding.len() != snapshot.dimensions {
            return Err(DocentError::InvalidArgument(format!(
                "Query embedding has {} dimensions, index has {}",
                query_embedding.len(),
                snapshot.dimensions
            )));
        }

        let query_norm = l2_norm(query_embedding);
        let mut scored: Vec<ScoredChunk> = snapshot
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: Arc::clone(&entry.chunk),
                score: cosine_with_norms(query_embedding, query_norm, &entry.embedding, entry.norm),
            })
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    pub fn len(&self) -> usize {
        self.current().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimensions(&self) -> usize {
        self.current().dimensions
    }

    fn current(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(|e| e.into_inner()))
    }
}
