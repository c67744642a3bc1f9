//! Selection of the page chunk most similar to the question.

use crate::chunk::chunk_text;
use crate::embeddings::EmbeddingEngine;
use ask_core::{AppError, AppResult};
use std::sync::Arc;

/// The chunk picked for a page, with its cosine similarity to the question.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedChunk {
    pub text: String,
    pub score: f32,
}

impl RankedChunk {
    /// What ranking returns for a page without any text.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            score: 0.0,
        }
    }
}

/// Picks the passage of a page that best answers a question.
#[async_trait::async_trait]
pub trait ChunkRanker: Send + Sync {
    async fn best_chunk(&self, text: &str, question: &str) -> AppResult<RankedChunk>;
}

/// Embedding-based ranker over fixed-size character chunks.
pub struct RelevanceRanker {
    engine: Arc<EmbeddingEngine>,
    chunk_size: usize,
}

impl RelevanceRanker {
    pub fn new(engine: Arc<EmbeddingEngine>, chunk_size: usize) -> Self {
        Self { engine, chunk_size }
    }
}

#[async_trait::async_trait]
impl ChunkRanker for RelevanceRanker {
    async fn best_chunk(&self, text: &str, question: &str) -> AppResult<RankedChunk> {
        let chunks = chunk_text(text, self.chunk_size);
        if chunks.is_empty() {
            return Ok(RankedChunk::empty());
        }

        // Question first, then every chunk, in one batch
        let mut inputs = Vec::with_capacity(chunks.len() + 1);
        inputs.push(question.to_string());
        inputs.extend(chunks.iter().map(|c| c.to_string()));

        let embeddings = self.engine.embed_texts(&inputs).await?;
        let (question_vec, chunk_vecs) = embeddings
            .split_first()
            .ok_or_else(|| AppError::Embedding("No embeddings returned".to_string()))?;

        if chunk_vecs.len() != chunks.len() {
            return Err(AppError::Embedding(format!(
                "Expected {} chunk embeddings, got {}",
                chunks.len(),
                chunk_vecs.len()
            )));
        }

        let scores: Vec<f32> = chunk_vecs
            .iter()
            .map(|v| cosine_similarity(question_vec, v))
            .collect();

        let (best, score) = first_max(&scores);
        tracing::debug!(
            "Selected chunk {} of {} (similarity {:.3})",
            best + 1,
            chunks.len(),
            score
        );

        Ok(RankedChunk {
            text: chunks[best].to_string(),
            score,
        })
    }
}

/// Index and value of the largest score; the earliest index wins ties.
fn first_max(scores: &[f32]) -> (usize, f32) {
    scores
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (idx, score)| {
            if score > best.1 {
                (idx, score)
            } else {
                best
            }
        })
}

/// Cosine similarity of two vectors; zero when either has no length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
