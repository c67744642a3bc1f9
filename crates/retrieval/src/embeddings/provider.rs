//! Embedding provider trait and factory.

use ask_core::config::RankingSettings;
use ask_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "ollama", "fastembed")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch, in input order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider from the ranking settings.
///
/// Model-backed providers may load weights here, so this is only called
/// once per process by [`super::EmbeddingEngine`].
pub async fn create_provider(settings: &RankingSettings) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match settings.embedding_provider.as_str() {
        "trigram" => Ok(Arc::new(super::providers::trigram::TrigramProvider::new(
            settings.dimensions,
        ))),

        "ollama" => {
            let mut provider = super::providers::ollama::OllamaProvider::new(
                settings.embedding_model.clone(),
                settings.dimensions,
            );
            if let Some(endpoint) = &settings.embedding_endpoint {
                provider = provider.with_base_url(endpoint.clone());
            }
            Ok(Arc::new(provider))
        }

        #[cfg(feature = "fastembed")]
        "fastembed" => {
            let provider =
                super::providers::fastembed::FastembedProvider::load(&settings.embedding_model)
                    .await?;
            Ok(Arc::new(provider))
        }

        #[cfg(not(feature = "fastembed"))]
        "fastembed" => Err(AppError::Config(
            "The fastembed embedding provider requires building with --features fastembed"
                .to_string(),
        )),

        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama, fastembed",
            other
        ))),
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
    async fn test_create_trigram_provider() {
        let settings = trigram_settings();

        let provider = create_provider(&settings).await.unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.dimensions(), 384);
    }

    #[tokio::test]
    async fn test_create_ollama_provider_is_lazy() {
        let settings = RankingSettings {
            embedding_provider: "ollama".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            dimensions: 768,
            ..Default::default()
        };

        // No request is made until something is embedded
        let provider = create_provider(&settings).await.unwrap();
        assert_eq!(provider.model_name(), "nomic-embed-text");
    }

    #[tokio::test]
    async fn test_create_unknown_provider() {
        let settings = RankingSettings {
            embedding_provider: "unknown".to_string(),
            ..Default::default()
        };

        let err = create_provider(&settings).await.unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&trigram_settings()).await.unwrap();

        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }

    #[cfg(not(feature = "fastembed"))]
    #[tokio::test]
    async fn test_fastembed_needs_its_feature() {
        let err = create_provider(&RankingSettings::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[cfg(feature = "fastembed")]
    #[tokio::test]
    #[ignore = "downloads the all-minilm-l6-v2 weights"]
    async fn test_default_provider_embeds_meaning() {
        let provider = create_provider(&RankingSettings::default()).await.unwrap();
        assert_eq!(provider.provider_name(), "fastembed");

        let texts = vec![
            "What is the capital city of France?".to_string(),
            "Capital gains tax rises in every city this year.".to_string(),
            "Paris is where the French government sits.".to_string(),
        ];
        let vectors = provider.embed_batch(&texts).await.unwrap();
        let tax = crate::cosine_similarity(&vectors[0], &vectors[1]);
        let paris = crate::cosine_similarity(&vectors[0], &vectors[2]);
        assert!(paris > tax, "paris={paris} tax={tax}");
    }
}
