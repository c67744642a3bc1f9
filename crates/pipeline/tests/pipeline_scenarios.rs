//! End-to-end runs of the query pipeline against stub collaborators.

mod common;

use ask_core::AppResult;
use ask_llm::{CompletionEvent, LlmRequest, StreamingCompletion};
use ask_pipeline::{
    spawn_fragment_pump, Classification, MemorySink, OrchestratorSettings, PipelineState, PumpEvent,
    SearchOrchestrator,
};
use ask_retrieval::embeddings::providers::trigram::TrigramProvider;
use ask_retrieval::{ChunkRanker, EmbeddingEngine, RankedChunk, RelevanceRanker};
use common::{result, FixedRanker, FixedSearch, MapFetcher, ScriptedModel};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn pages(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(url, body)| (url.to_string(), body.to_string()))
        .collect()
}

#[tokio::test]
async fn capital_of_france_is_answered_directly() {
    let model = Arc::new(ScriptedModel::new(&[
        "This is general knowledge. <engine>direct-answer</engine>",
        "The capital of France is Paris.",
    ]));
    let mut sink = MemorySink::new();

    let outcome = SearchOrchestrator::new(model.clone(), OrchestratorSettings::default())
        .run("What's the capital of France?", &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome.classification, Classification::DirectAnswer);
    assert!(sink.fragments.len() > 1, "answer should arrive in several fragments");
    assert!(sink.fragments.iter().all(|f| !f.is_empty()));
    assert!(sink.text().contains("Paris"));
    assert!(sink.notes.is_empty());
    assert!(sink.finished);
    assert_eq!(model.prompts().len(), 2);
}

#[tokio::test]
async fn web_search_prompt_lists_every_result_with_a_timestamp() {
    let model = Arc::new(ScriptedModel::new(&[
        "<engine>web-search</engine>",
        "<search>X news</search>",
        "Here is the latest on X.",
    ]));
    let search = Arc::new(FixedSearch::new(vec![
        result("X launches", "https://one.example"),
        result("X earnings", "https://two.example"),
        result("X lawsuit", "https://three.example"),
    ]));
    let fetcher = MapFetcher(pages(&[
        ("https://one.example", "launch story"),
        ("https://two.example", "earnings story"),
        ("https://three.example", "lawsuit story"),
    ]));
    let mut sink = MemorySink::new();

    let outcome = SearchOrchestrator::new(model.clone(), OrchestratorSettings::default())
        .with_text_search(search.clone())
        .with_fetcher(Arc::new(fetcher))
        .with_ranker(Arc::new(FixedRanker))
        .run("latest news on X", &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome.classification, Classification::WebSearch);
    assert_eq!(outcome.search_query.as_deref(), Some("X news"));
    assert_eq!(search.queries.lock().unwrap().as_slice(), ["X news"]);
    assert_eq!(
        outcome.states,
        vec![
            PipelineState::Classifying,
            PipelineState::Rewriting,
            PipelineState::FetchingAndRanking,
            PipelineState::Synthesizing,
            PipelineState::StreamingAnswer,
            PipelineState::Done
        ]
    );

    let prompt = outcome.synthesis_prompt.unwrap();
    for title in ["X launches", "X earnings", "X lawsuit"] {
        assert!(prompt.contains(title), "missing {title}");
    }
    assert!(prompt.contains("chunk: earnings story"));
    assert!(prompt.contains("Not all results may be relevant"));
    assert!(prompt.contains("latest news on X"));

    let timestamp = prompt
        .split("The current time is ")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .map(|t| t.trim_end_matches('.'))
        .unwrap();
    assert!(
        chrono::DateTime::parse_from_rfc3339(timestamp).is_ok(),
        "not an ISO 8601 timestamp: {timestamp}"
    );

    assert_eq!(sink.text(), "Here is the latest on X.");
}

/// Wraps a ranker and keeps every chunk it selected.
struct RecordingRanker {
    inner: RelevanceRanker,
    picks: Mutex<Vec<RankedChunk>>,
}

#[async_trait::async_trait]
impl ChunkRanker for RecordingRanker {
    async fn best_chunk(&self, text: &str, question: &str) -> AppResult<RankedChunk> {
        let chunk = self.inner.best_chunk(text, question).await?;
        self.picks.lock().unwrap().push(chunk.clone());
        Ok(chunk)
    }
}

#[tokio::test]
async fn related_page_outranks_unrelated_page() {
    let model = Arc::new(ScriptedModel::new(&["<search>capital France</search>", "Paris."]));
    let search = Arc::new(FixedSearch::new(vec![
        result("France", "https://france.example"),
        result("Gardening", "https://garden.example"),
    ]));
    let fetcher = MapFetcher(pages(&[
        (
            "https://france.example",
            "Paris is the capital city of France and its largest city.",
        ),
        (
            "https://garden.example",
            "Tomatoes need full sun, rich soil and regular watering in summer.",
        ),
    ]));
    let engine = Arc::new(EmbeddingEngine::with_provider(Arc::new(TrigramProvider::new(384))));
    let ranker = Arc::new(RecordingRanker {
        inner: RelevanceRanker::new(engine, 8000),
        picks: Mutex::new(Vec::new()),
    });
    let mut sink = MemorySink::new();

    let outcome = SearchOrchestrator::new(model, OrchestratorSettings::default())
        .with_classification(Classification::WebSearch)
        .with_text_search(search)
        .with_fetcher(Arc::new(fetcher))
        .with_ranker(ranker.clone())
        .run("What is the capital city of France?", &mut sink)
        .await
        .unwrap();

    let prompt = outcome.synthesis_prompt.unwrap();
    for expected in ["France", "Gardening", "https://france.example", "https://garden.example"] {
        assert!(prompt.contains(expected), "missing {expected}");
    }

    let picks = ranker.picks.lock().unwrap();
    assert_eq!(picks.len(), 2);
    let score_of = |needle: &str| {
        picks
            .iter()
            .find(|p| p.text.contains(needle))
            .map(|p| p.score)
            .unwrap()
    };
    assert!(score_of("Paris") > score_of("Tomatoes"));
}

#[tokio::test]
async fn missing_rewrite_tag_searches_the_raw_query() {
    let model = Arc::new(ScriptedModel::new(&[
        "<engine>web-search</engine>",
        "X news",
        "Answer.",
    ]));
    let search = Arc::new(FixedSearch::new(vec![result("X", "https://x.example")]));
    let mut sink = MemorySink::new();

    let outcome = SearchOrchestrator::new(model, OrchestratorSettings::default())
        .with_text_search(search.clone())
        .with_fetcher(Arc::new(MapFetcher(pages(&[("https://x.example", "body")]))))
        .with_ranker(Arc::new(FixedRanker))
        .run("latest news on X", &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome.search_query.as_deref(), Some("latest news on X"));
    assert_eq!(search.queries.lock().unwrap().as_slice(), ["latest news on X"]);
    assert_eq!(sink.notes.len(), 1);
    assert!(sink.finished);
}

#[tokio::test]
async fn untagged_classification_falls_back_to_direct_answer_with_a_note() {
    let model = Arc::new(ScriptedModel::new(&["I would just answer it.", "Paris."]));
    let mut sink = MemorySink::new();

    let outcome = SearchOrchestrator::new(model, OrchestratorSettings::default())
        .run("What's the capital of France?", &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome.classification, Classification::DirectAnswer);
    assert_eq!(sink.notes.len(), 1);
    assert_eq!(sink.text(), "Paris.");
}

#[tokio::test]
async fn failed_answer_call_is_not_marked_done() {
    // Classification succeeds, then the script runs dry for the answer
    let model = Arc::new(ScriptedModel::new(&["<engine>direct-answer</engine>"]));
    let mut sink = MemorySink::new();

    let result = SearchOrchestrator::new(model, OrchestratorSettings::default())
        .run("What's the capital of France?", &mut sink)
        .await;

    assert!(result.is_err());
    assert!(!sink.finished);
}

#[tokio::test]
async fn pump_delivers_a_model_stream_to_a_channel() {
    let model = Arc::new(ScriptedModel::new(&["The capital of France is Paris."]));
    let completion = StreamingCompletion::new(model, LlmRequest::new("capital of France?", "m"));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let handle = spawn_fragment_pump(completion, Duration::from_millis(1), tx);

    let mut text = String::new();
    while let Some(event) = rx.recv().await {
        match event {
            PumpEvent::Fragment(fragment) => text.push_str(&fragment),
            PumpEvent::Done => break,
            PumpEvent::Failed(e) => panic!("stream failed: {e}"),
        }
    }
    handle.join().await;

    assert_eq!(text, "The capital of France is Paris.");
}

#[tokio::test]
async fn stream_of_only_markers_yields_nothing() {
    let events = vec![
        Ok(CompletionEvent::Role("assistant".to_string())),
        Ok(CompletionEvent::Content(String::new())),
        Ok(CompletionEvent::Finish("stop".to_string())),
        Ok(CompletionEvent::Done),
    ];
    let completion = StreamingCompletion::from_events(Box::pin(futures::stream::iter(events)));

    let fragments: Vec<AppResult<String>> = completion.collect().await;
    assert!(fragments.is_empty());
}
