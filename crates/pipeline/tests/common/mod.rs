//! Stub collaborators for the end-to-end pipeline tests.

#![allow(dead_code)]

use ask_core::{AppError, AppResult};
use ask_llm::{CompletionEvent, EventStream, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use ask_retrieval::{ChunkRanker, PageFetcher, RankedChunk, SearchResult, TextSearch};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Model stub answering each call with the next scripted reply, streamed in
/// small pieces and padded with the markers a real provider sends.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|r| r.prompt.clone()).collect()
    }

    fn next(&self, request: &LlmRequest) -> AppResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Llm("no scripted reply left".to_string()))
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedModel {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        Ok(LlmResponse {
            content: self.next(request)?,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<EventStream> {
        let reply = self.next(request)?;
        let chars: Vec<char> = reply.chars().collect();

        let mut events = vec![
            Ok(CompletionEvent::Role("assistant".to_string())),
            Ok(CompletionEvent::Content(String::new())),
        ];
        for piece in chars.chunks(4) {
            events.push(Ok(CompletionEvent::Content(piece.iter().collect())));
        }
        events.push(Ok(CompletionEvent::Finish("stop".to_string())));
        events.push(Ok(CompletionEvent::Done));

        Ok(Box::pin(futures::stream::iter(events)))
    }
}

/// Text search returning a fixed list and recording the queries it saw.
pub struct FixedSearch {
    results: Vec<SearchResult>,
    pub queries: Mutex<Vec<String>>,
}

impl FixedSearch {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl TextSearch for FixedSearch {
    async fn search_text(&self, query: &str, max_results: usize) -> AppResult<Vec<SearchResult>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.results.iter().take(max_results).cloned().collect())
    }
}

/// Fetcher serving page bodies from a map; unknown URLs fail.
pub struct MapFetcher(pub HashMap<String, String>);

#[async_trait::async_trait]
impl PageFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> AppResult<String> {
        self.0
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::Fetch(format!("no page for {}", url)))
    }
}

/// Ranker returning a fixed chunk per page body.
pub struct FixedRanker;

#[async_trait::async_trait]
impl ChunkRanker for FixedRanker {
    async fn best_chunk(&self, text: &str, _question: &str) -> AppResult<RankedChunk> {
        Ok(RankedChunk {
            text: format!("chunk: {}", text),
            score: 1.0,
        })
    }
}

pub fn result(title: &str, url: &str) -> SearchResult {
    SearchResult {
        title: title.to_string(),
        url: url.to_string(),
        snippet: String::new(),
    }
}
