//! LLM integration crate for the ask pipeline.
//!
//! This crate provides a provider-agnostic abstraction for streaming
//! completions, plus the two primitives every model round-trip in the
//! pipeline relies on:
//! - [`StreamingCompletion`]: a lazy stream of answer text that hides
//!   protocol markers
//! - [`extract_tag`]: parsing `<tag>value</tag>` fields out of model output
//!
//! # Providers
//! - **OpenAI-compatible** chat completions (SSE)
//! - **Ollama** chat (NDJSON)
//!
//! # Example
//! ```no_run
//! use ask_llm::{LlmRequest, StreamingCompletion, providers::OllamaClient};
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(OllamaClient::new());
//! let mut answer = StreamingCompletion::new(client, LlmRequest::new("Hello!", "llama3.2"));
//! while let Some(fragment) = answer.next().await {
//!     print!("{}", fragment?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod completion;
pub mod factory;
pub mod providers;
pub mod tags;
pub mod types;

// Re-export main types
pub use client::{CompletionEvent, EventStream, LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use completion::StreamingCompletion;
pub use factory::{create_client, create_client_from_config};
pub use providers::{OllamaClient, OpenAiClient};
pub use tags::extract_tag;
pub use types::ProviderType;
