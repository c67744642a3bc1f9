//! Embedding engine for chunk ranking.
//!
//! Provides provider-agnostic embedding generation. The provider is built
//! on first use and then shared for the rest of the process.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use ask_core::config::RankingSettings;
use ask_core::AppResult;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Central embedding engine owning the process-wide provider.
pub struct EmbeddingEngine {
    settings: RankingSettings,
    provider: OnceCell<Arc<dyn EmbeddingProvider>>,
}

impl EmbeddingEngine {
    /// Create an engine that builds its provider from `settings` on first use.
    pub fn new(settings: RankingSettings) -> Self {
        Self {
            settings,
            provider: OnceCell::new(),
        }
    }

    /// Create an engine around an already constructed provider.
    pub fn with_provider(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            settings: RankingSettings::default(),
            provider: OnceCell::new_with(Some(provider)),
        }
    }

    /// Get the provider, creating it if this is the first call.
    pub async fn provider(&self) -> AppResult<Arc<dyn EmbeddingProvider>> {
        let provider = self
            .provider
            .get_or_try_init(|| async {
                tracing::debug!(
                    "Creating embedding provider: provider={}, model={}, dimensions={}",
                    self.settings.embedding_provider,
                    self.settings.embedding_model,
                    self.settings.dimensions
                );
                create_provider(&self.settings).await
            })
            .await?;

        Ok(Arc::clone(provider))
    }

    /// Embed multiple texts, in input order.
    pub async fn embed_texts(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let provider = self.provider().await?;

        tracing::debug!(
            "Embedding {} texts using provider '{}' (model: {})",
            texts.len(),
            provider.provider_name(),
            provider.model_name()
        );

        provider.embed_batch(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigram_settings() -> RankingSettings {
        RankingSettings {
            embedding_provider: "trigram".to_string(),
            embedding_model: "trigram-v1".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_engine_builds_configured_provider() {
        let engine = EmbeddingEngine::new(trigram_settings());

        let texts = vec!["hello world".to_string(), "test embedding".to_string()];
        let embeddings = engine.embed_texts(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].len(), 384);
    }

    #[tokio::test]
    async fn test_engine_creates_provider_once() {
        let engine = EmbeddingEngine::new(trigram_settings());

        let first = engine.provider().await.unwrap();
        let second = engine.provider().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_engine_empty_input() {
        let engine = EmbeddingEngine::new(RankingSettings {
            embedding_provider: "unknown".to_string(),
            ..Default::default()
        });

        // No provider is needed for nothing to embed
        assert!(engine.embed_texts(&[]).await.unwrap().is_empty());
        assert!(engine.provider().await.is_err());
    }

    #[tokio::test]
    async fn test_engine_with_injected_provider() {
        let engine =
            EmbeddingEngine::with_provider(Arc::new(providers::trigram::TrigramProvider::new(8)));
        assert_eq!(engine.provider().await.unwrap().dimensions(), 8);
    }
}
