//! Fetch command handler.
//!
//! Converts one page to text the way the web-search branch does, and
//! optionally shows the chunk that would be handed to the model.

use ask_core::{config::AppConfig, AppResult};
use ask_retrieval::{ChunkRanker, ContentFetcher, EmbeddingEngine, PageFetcher, RelevanceRanker};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

/// Convert a page to text
#[derive(Args, Debug)]
pub struct FetchCommand {
    /// Page URL
    pub url: String,

    /// Print only the chunk closest to this question
    #[arg(short, long)]
    pub question: Option<String>,

    /// Override the configured word limit
    #[arg(long)]
    pub word_limit: Option<usize>,
}

impl FetchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing fetch command for {}", self.url);

        let word_limit = self.word_limit.unwrap_or(config.fetch.word_limit);
        let fetcher = ContentFetcher::new(&config.fetch.converter, word_limit)?
            .with_timeout(Duration::from_secs(config.request_timeout_secs));
        let text = fetcher.fetch(&self.url).await?;

        match &self.question {
            Some(question) => {
                let engine = Arc::new(EmbeddingEngine::new(config.ranking.clone()));
                let ranker = RelevanceRanker::new(engine, config.ranking.chunk_size);
                let chunk = ranker.best_chunk(&text, question).await?;
                tracing::debug!("Best chunk score: {:.4}", chunk.score);
                println!("{}", chunk.text);
            }
            None => println!("{}", text),
        }

        Ok(())
    }
}
