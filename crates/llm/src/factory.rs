//! LLM provider factory.
//!
//! Builds the single client instance that the top-level caller owns and
//! threads through every pipeline stage.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use ask_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key (required by "openai")
/// * `timeout` - Optional bound on each request
///
/// # Errors
/// Returns a configuration error if the provider is unknown or a required
/// secret is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Option<Duration>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    match provider_type {
        ProviderType::Ollama => {
            let mut client = OllamaClient::with_base_url(
                endpoint.unwrap_or(crate::providers::ollama::DEFAULT_OLLAMA_URL),
            );
            if let Some(timeout) = timeout {
                client = client.with_timeout(timeout);
            }
            Ok(Arc::new(client))
        }
        ProviderType::OpenAI => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            let mut client = OpenAiClient::with_base_url(
                endpoint.unwrap_or(crate::providers::openai::DEFAULT_OPENAI_URL),
                api_key,
            );
            if let Some(timeout) = timeout {
                client = client.with_timeout(timeout);
            }
            Ok(Arc::new(client))
        }
    }
}

/// Create the LLM client described by the application configuration.
pub fn create_client_from_config(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    create_client(
        &config.provider,
        config.endpoint.as_deref(),
        config.api_key.as_deref(),
        Some(Duration::from_secs(config.request_timeout_secs)),
    )
}
