//! Retrieval collaborators for the ask pipeline.
//!
//! This crate provides:
//! - Text and image search over a SearXNG instance
//! - Page fetching through an external HTML-to-text converter
//! - Fixed-size character chunking
//! - Embedding providers and the process-wide embedding engine
//! - Relevance ranking of chunks against a question
//! - Terminal rendering of image thumbnails

pub mod chunk;
pub mod embeddings;
pub mod fetcher;
pub mod ranker;
pub mod render;
pub mod search;

pub use chunk::chunk_text;
pub use embeddings::{EmbeddingEngine, EmbeddingProvider};
pub use fetcher::{truncate_words, ContentFetcher, PageFetcher};
pub use ranker::{cosine_similarity, ChunkRanker, RankedChunk, RelevanceRanker};
pub use render::{ImageRenderer, TerminalImageRenderer};
pub use search::{ImageResult, ImageSearch, SearchResult, SearxngClient, TextSearch};
