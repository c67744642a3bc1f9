//! Pretrained sentence embeddings run locally with fastembed.

use crate::embeddings::EmbeddingProvider;
use ask_core::{AppError, AppResult};
use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::{Arc, Mutex};

const BATCH_SIZE: usize = 32;

/// A fastembed model loaded once and shared by every ranking call.
pub struct FastembedProvider {
    model_name: String,
    dimensions: usize,
    model: Arc<Mutex<TextEmbedding>>,
}

impl std::fmt::Debug for FastembedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastembedProvider")
            .field("model_name", &self.model_name)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

fn model_for(name: &str) -> AppResult<(EmbeddingModel, usize)> {
    match name {
        "all-minilm-l6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
        "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        "nomic-embed-text-v1.5" => Ok((EmbeddingModel::NomicEmbedTextV15, 768)),
        "multilingual-e5-small" => Ok((EmbeddingModel::MultilingualE5Small, 384)),
        other => Err(AppError::Config(format!(
            "Unknown fastembed model '{}'. Supported: all-minilm-l6-v2, bge-small-en-v1.5, \
             bge-base-en-v1.5, nomic-embed-text-v1.5, multilingual-e5-small",
            other
        ))),
    }
}

impl FastembedProvider {
    /// Load `model_name`, downloading weights on first use.
    pub async fn load(model_name: &str) -> AppResult<Self> {
        let (model, dimensions) = model_for(model_name)?;

        tracing::info!("Loading embedding model '{}'", model_name);

        let loaded = tokio::task::spawn_blocking(move || {
            TextEmbedding::try_new(InitOptions::new(model).with_show_download_progress(false))
        })
        .await
        .map_err(|e| AppError::Embedding(format!("Embedding model loader panicked: {}", e)))?
        .map_err(|e| AppError::Embedding(format!("Failed to load embedding model: {}", e)))?;

        Ok(Self {
            model_name: model_name.to_string(),
            dimensions,
            model: Arc::new(Mutex::new(loaded)),
        })
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FastembedProvider {
    fn provider_name(&self) -> &str {
        "fastembed"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| AppError::Embedding("Embedding model lock poisoned".to_string()))?;
            model
                .embed(texts, Some(BATCH_SIZE))
                .map_err(|e| AppError::Embedding(format!("Local embedding failed: {}", e)))
        })
        .await
        .map_err(|e| AppError::Embedding(format!("Embedding task panicked: {}", e)))?
    }
}
