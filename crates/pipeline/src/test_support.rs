//! Scripted model client shared by the unit tests.

use ask_core::{AppError, AppResult};
use ask_llm::{CompletionEvent, EventStream, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replies to each call with the next scripted text, streamed word by word
/// between a role marker and the end markers.
pub(crate) struct ScriptedClient {
    replies: Mutex<VecDeque<String>>,
    pub(crate) requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn next_reply(&self, request: &LlmRequest) -> AppResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Llm("script exhausted".to_string()))
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        Ok(LlmResponse {
            content: self.next_reply(request)?,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<EventStream> {
        let reply = self.next_reply(request)?;

        let mut events = vec![Ok(CompletionEvent::Role("assistant".to_string()))];
        events.extend(
            reply
                .split_inclusive(' ')
                .map(|w| Ok(CompletionEvent::Content(w.to_string()))),
        );
        events.push(Ok(CompletionEvent::Finish("stop".to_string())));
        events.push(Ok(CompletionEvent::Done));

        Ok(Box::pin(futures::stream::iter(events)))
    }
}
