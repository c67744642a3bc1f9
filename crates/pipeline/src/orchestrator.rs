//! The per-query state machine.
//!
//! Every run starts in `classifying` and ends in `done`:
//! - direct-answer: `streaming_answer`
//! - web-search: `rewriting`, `fetching_and_ranking`, `synthesizing`, `streaming_answer`
//! - image-search: `rewriting`, `image_listing`
//! - unknown: nothing in between

use crate::classification::Classification;
use crate::classifier::QueryClassifier;
use crate::rewriter::QueryRewriter;
use crate::sink::OutputSink;
use ask_core::{AppConfig, AppError, AppResult};
use ask_llm::{LlmClient, LlmRequest, StreamingCompletion};
use ask_prompt::{build_prompt, load_prompt, BuiltPrompt};
use ask_retrieval::{ChunkRanker, ImageRenderer, ImageSearch, PageFetcher, SearchResult, TextSearch};
use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use futures::StreamExt;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Source of the current time used in prompts.
pub type Clock = Arc<dyn Fn() -> DateTime<FixedOffset> + Send + Sync>;

/// Where a query is in its processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Classifying,
    Rewriting,
    FetchingAndRanking,
    ImageListing,
    Synthesizing,
    StreamingAnswer,
    Done,
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Classifying => "classifying",
            PipelineState::Rewriting => "rewriting",
            PipelineState::FetchingAndRanking => "fetching_and_ranking",
            PipelineState::ImageListing => "image_listing",
            PipelineState::Synthesizing => "synthesizing",
            PipelineState::StreamingAnswer => "streaming_answer",
            PipelineState::Done => "done",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Knobs of a single run.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Model for the user-facing answer
    pub model: String,

    /// Model for classification and rewriting
    pub fast_model: String,

    pub temperature: f32,
    pub max_tokens: u32,
    pub text_results: usize,
    pub image_results: usize,

    /// Results fetched and ranked at the same time
    pub fetch_concurrency: usize,

    pub prompts_dir: Option<PathBuf>,
}

impl OrchestratorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            fast_model: config.fast_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            text_results: config.search.text_results,
            image_results: config.search.image_results,
            fetch_concurrency: config.fetch.concurrency,
            prompts_dir: config.prompts_dir.clone(),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// One search result with the passage chosen to represent it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourcePassage {
    pub title: String,
    pub url: String,
    pub passage: String,
}

#[derive(Serialize)]
struct QuestionContext<'a> {
    question: &'a str,
}

#[derive(Serialize)]
struct SynthesisContext<'a> {
    question: &'a str,
    timestamp: &'a str,
    results: &'a [SourcePassage],
}

/// What a completed run went through.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub classification: Classification,

    /// Every state entered, in order, ending with `Done`
    pub states: Vec<PipelineState>,

    /// Query sent to the search provider, for the search branches
    pub search_query: Option<String>,

    /// User message of the synthesis call, for the web-search branch
    pub synthesis_prompt: Option<String>,
}

/// Drives one query from classification to the last answer fragment.
///
/// Each query gets its own orchestrator; [`run`](Self::run) consumes it.
pub struct SearchOrchestrator {
    client: Arc<dyn LlmClient>,
    settings: OrchestratorSettings,
    classifier: QueryClassifier,
    rewriter: QueryRewriter,
    text_search: Option<Arc<dyn TextSearch>>,
    image_search: Option<Arc<dyn ImageSearch>>,
    fetcher: AppResult<Arc<dyn PageFetcher>>,
    ranker: Option<Arc<dyn ChunkRanker>>,
    renderer: Option<Arc<dyn ImageRenderer>>,
    clock: Clock,
    forced: Option<Classification>,
    states: Vec<PipelineState>,
}

fn not_configured(what: &str) -> AppError {
    AppError::Config(format!("No {} is configured", what))
}

impl SearchOrchestrator {
    /// Create an orchestrator that can answer directly. Search branches
    /// need the matching `with_*` collaborators.
    pub fn new(client: Arc<dyn LlmClient>, settings: OrchestratorSettings) -> Self {
        let classifier = QueryClassifier::new(
            Arc::clone(&client),
            settings.fast_model.clone(),
            settings.prompts_dir.clone(),
        );
        let rewriter = QueryRewriter::new(
            Arc::clone(&client),
            settings.fast_model.clone(),
            settings.prompts_dir.clone(),
        );

        Self {
            client,
            settings,
            classifier,
            rewriter,
            text_search: None,
            image_search: None,
            fetcher: Err(not_configured("page fetcher")),
            ranker: None,
            renderer: None,
            clock: Arc::new(|| Local::now().fixed_offset()),
            forced: None,
            states: Vec::new(),
        }
    }

    pub fn with_text_search(mut self, search: Arc<dyn TextSearch>) -> Self {
        self.text_search = Some(search);
        self
    }

    pub fn with_image_search(mut self, search: Arc<dyn ImageSearch>) -> Self {
        self.image_search = Some(search);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Ok(fetcher);
        self
    }

    /// Record why no fetcher could be built. The error is returned when a
    /// web search reaches the fetch step, before any page is requested.
    pub fn with_fetcher_unavailable(mut self, reason: AppError) -> Self {
        self.fetcher = Err(reason);
        self
    }

    pub fn with_ranker(mut self, ranker: Arc<dyn ChunkRanker>) -> Self {
        self.ranker = Some(ranker);
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ImageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Skip the classifier and use `classification`.
    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.forced = Some(classification);
        self
    }

    fn enter(&mut self, state: PipelineState) {
        match self.states.last() {
            Some(previous) => tracing::debug!("Pipeline state: {} -> {}", previous, state),
            None => tracing::debug!("Pipeline state: {}", state),
        }
        self.states.push(state);
    }

    fn timestamp(&self) -> String {
        (self.clock)().to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    /// Answer `query`, forwarding answer text and notes to `sink`.
    ///
    /// `sink.done()` is called only when the run completes; on error the
    /// fragments already appended remain with the sink.
    pub async fn run(mut self, query: &str, sink: &mut dyn OutputSink) -> AppResult<RunOutcome> {
        self.enter(PipelineState::Classifying);
        let classification = match self.forced {
            Some(classification) => {
                tracing::debug!("Classification forced to {}", classification);
                classification
            }
            None => {
                let verdict = self.classifier.classify(query).await?;
                if let Some(note) = &verdict.note {
                    sink.note(note)?;
                }
                verdict.classification
            }
        };
        tracing::info!("Answering with strategy: {}", classification);

        let mut search_query = None;
        let mut synthesis_prompt = None;

        match classification {
            Classification::DirectAnswer => {
                let definition = load_prompt(self.settings.prompts_dir.as_deref(), "ask.direct")?;
                let prompt = build_prompt(&definition, &QuestionContext { question: query })?;
                self.stream_answer(prompt, sink).await?;
            }

            Classification::WebSearch => {
                let timestamp = self.timestamp();
                let rewritten = self.rewrite(query, &timestamp, sink).await?;

                self.enter(PipelineState::FetchingAndRanking);
                let text_search = self
                    .text_search
                    .clone()
                    .ok_or_else(|| not_configured("text search provider"))?;
                let fetcher =
                    std::mem::replace(&mut self.fetcher, Err(not_configured("page fetcher")))?;
                let ranker = self.ranker.clone().ok_or_else(|| not_configured("chunk ranker"))?;

                let results = text_search
                    .search_text(&rewritten, self.settings.text_results)
                    .await?;
                if results.is_empty() {
                    sink.note(&format!("The search for \"{}\" returned no results", rewritten))?;
                }
                let mut passages = self
                    .gather_passages(query, results, fetcher, ranker, sink)
                    .await?;

                self.enter(PipelineState::Synthesizing);
                // Most relevant result last, right before the question
                passages.reverse();
                let definition =
                    load_prompt(self.settings.prompts_dir.as_deref(), "ask.synthesize")?;
                let prompt = build_prompt(
                    &definition,
                    &SynthesisContext {
                        question: query,
                        timestamp: &timestamp,
                        results: &passages,
                    },
                )?;

                synthesis_prompt = Some(prompt.user.clone());
                search_query = Some(rewritten);
                self.stream_answer(prompt, sink).await?;
            }

            Classification::ImageSearch => {
                let timestamp = self.timestamp();
                let rewritten = self.rewrite(query, &timestamp, sink).await?;

                self.enter(PipelineState::ImageListing);
                let image_search = self
                    .image_search
                    .clone()
                    .ok_or_else(|| not_configured("image search provider"))?;
                let renderer = self
                    .renderer
                    .clone()
                    .ok_or_else(|| not_configured("image renderer"))?;

                let images = image_search
                    .search_images(&rewritten, self.settings.image_results)
                    .await?;
                if images.is_empty() {
                    sink.note(&format!(
                        "The image search for \"{}\" returned no results",
                        rewritten
                    ))?;
                }

                for image in images {
                    match renderer.render(&image.thumbnail_url).await {
                        Ok(()) => {}
                        Err(e @ AppError::Config(_)) => return Err(e),
                        Err(e) => {
                            tracing::warn!("Failed to render {}: {}", image.thumbnail_url, e);
                            sink.note(&format!("Could not show {}: {}", image.thumbnail_url, e))?;
                        }
                    }
                }
                search_query = Some(rewritten);
            }

            Classification::Unknown => {
                tracing::warn!("No strategy for an unknown classification");
                sink.note("The query could not be routed to any strategy, nothing to do")?;
            }
        }

        self.enter(PipelineState::Done);
        sink.done()?;

        Ok(RunOutcome {
            classification,
            states: self.states,
            search_query,
            synthesis_prompt,
        })
    }

    /// Rewrite for search, falling back to the query as typed when the
    /// model gives no usable `<search>` tag.
    async fn rewrite(
        &mut self,
        query: &str,
        timestamp: &str,
        sink: &mut dyn OutputSink,
    ) -> AppResult<String> {
        self.enter(PipelineState::Rewriting);

        match self.rewriter.rewrite(query, timestamp).await {
            Ok(rewritten) => {
                tracing::debug!("Rewrote query to {:?}", rewritten);
                Ok(rewritten)
            }
            Err(AppError::Extraction(reason)) => {
                tracing::warn!("{}; searching for the original query", reason);
                sink.note("Could not rewrite the query, searching for it as typed")?;
                Ok(query.to_string())
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch and rank every result. A result whose page cannot be used
    /// keeps its provider snippet as the passage.
    async fn gather_passages(
        &self,
        question: &str,
        results: Vec<SearchResult>,
        fetcher: Arc<dyn PageFetcher>,
        ranker: Arc<dyn ChunkRanker>,
        sink: &mut dyn OutputSink,
    ) -> AppResult<Vec<SourcePassage>> {
        let concurrency = self.settings.fetch_concurrency.max(1);

        let ranked: Vec<(SearchResult, AppResult<String>)> = futures::stream::iter(results)
            .map(|result| {
                let fetcher = Arc::clone(&fetcher);
                let ranker = Arc::clone(&ranker);
                async move {
                    let passage = match fetcher.fetch(&result.url).await {
                        Ok(text) => ranker
                            .best_chunk(&text, question)
                            .await
                            .map(|chunk| chunk.text),
                        Err(e) => Err(e),
                    };
                    (result, passage)
                }
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut passages = Vec::with_capacity(ranked.len());
        for (result, passage) in ranked {
            let passage = match passage {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => {
                    tracing::debug!("No page text for {}, using its snippet", result.url);
                    result.snippet.clone()
                }
                Err(e) => {
                    tracing::warn!("Failed to use {}: {}", result.url, e);
                    sink.note(&format!(
                        "Could not read {} ({}), using its search snippet",
                        result.url, e
                    ))?;
                    result.snippet.clone()
                }
            };

            passages.push(SourcePassage {
                title: result.title,
                url: result.url,
                passage,
            });
        }

        Ok(passages)
    }

    async fn stream_answer(
        &mut self,
        prompt: BuiltPrompt,
        sink: &mut dyn OutputSink,
    ) -> AppResult<()> {
        self.enter(PipelineState::StreamingAnswer);

        let mut request = LlmRequest::new(prompt.user, &self.settings.model)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let mut completion = StreamingCompletion::new(Arc::clone(&self.client), request);
        let mut fragments = 0usize;
        while let Some(fragment) = completion.next().await {
            sink.append(&fragment?)?;
            fragments += 1;
        }

        tracing::debug!("Streamed {} answer fragments", fragments);
        Ok(())
    }
}
