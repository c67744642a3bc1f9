//! Query command handler.
//!
//! Runs the full pipeline for one question and streams the answer to stdout.

use super::join_words;
use ask_core::{config::AppConfig, AppResult};
use ask_llm::create_client_from_config;
use ask_pipeline::{Classification, OrchestratorSettings, OutputSink, SearchOrchestrator};
use ask_retrieval::{
    ContentFetcher, EmbeddingEngine, RelevanceRanker, SearxngClient, TerminalImageRenderer,
};
use clap::Args;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Answer a question
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// The question to answer
    #[arg(required = true)]
    pub question: Vec<String>,

    /// Skip classification and answer with this engine
    /// (direct-answer, web-search, image-search)
    #[arg(short, long, value_parser = parse_engine)]
    pub engine: Option<Classification>,

    /// Results fetched and ranked at the same time
    #[arg(long)]
    pub concurrency: Option<usize>,
}

fn parse_engine(name: &str) -> Result<Classification, String> {
    match Classification::from_name(name) {
        Classification::Unknown => Err(format!(
            "unknown engine '{}', expected one of: {}",
            name,
            Classification::ENGINES.map(|e| e.name()).join(", ")
        )),
        engine => Ok(engine),
    }
}

/// Writes answer text to stdout and notes to stderr.
struct StdoutSink {
    out: std::io::Stdout,
}

impl OutputSink for StdoutSink {
    fn append(&mut self, fragment: &str) -> AppResult<()> {
        let mut out = self.out.lock();
        out.write_all(fragment.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    fn note(&mut self, message: &str) -> AppResult<()> {
        eprintln!("note: {}", message);
        Ok(())
    }

    fn done(&mut self) -> AppResult<()> {
        writeln!(self.out.lock())?;
        Ok(())
    }
}

impl QueryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let question = join_words(&self.question)?;
        tracing::info!("Executing query command");
        tracing::debug!("Question: {}", question);

        let timeout = Duration::from_secs(config.request_timeout_secs);
        let client = create_client_from_config(config)?;

        let mut settings = OrchestratorSettings::from_config(config);
        if let Some(concurrency) = self.concurrency {
            settings.fetch_concurrency = concurrency;
        }

        let search =
            Arc::new(SearxngClient::new(config.search.endpoint.as_str()).with_timeout(timeout));
        let engine = Arc::new(EmbeddingEngine::new(config.ranking.clone()));
        let ranker = RelevanceRanker::new(engine, config.ranking.chunk_size);
        let renderer =
            TerminalImageRenderer::new(config.render.command.clone())?.with_timeout(timeout);

        let mut orchestrator = SearchOrchestrator::new(client, settings)
            .with_text_search(search.clone())
            .with_image_search(search)
            .with_ranker(Arc::new(ranker))
            .with_renderer(Arc::new(renderer));

        // A missing converter only matters once a web search needs it
        orchestrator = match ContentFetcher::new(&config.fetch.converter, config.fetch.word_limit) {
            Ok(fetcher) => orchestrator.with_fetcher(Arc::new(fetcher.with_timeout(timeout))),
            Err(e) => orchestrator.with_fetcher_unavailable(e),
        };

        if let Some(engine) = self.engine {
            orchestrator = orchestrator.with_classification(engine);
        }

        let mut sink = StdoutSink {
            out: std::io::stdout(),
        };
        let outcome = orchestrator.run(&question, &mut sink).await?;

        tracing::debug!(
            "Answered as {} through {:?}",
            outcome.classification,
            outcome.states
        );
        if let Some(search_query) = outcome.search_query {
            tracing::debug!("Searched for: {}", search_query);
        }

        Ok(())
    }
}
