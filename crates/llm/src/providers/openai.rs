//! OpenAI-compatible chat completions provider.
//!
//! Works against any server exposing `POST /chat/completions` with
//! server-sent-event streaming (OpenAI, vLLM, llama.cpp server, LM Studio).

use super::lines::lines;
use crate::client::{CompletionEvent, EventStream, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use ask_core::{AppError, AppResult};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default base URL for the OpenAI API.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ResponseChoice>,
    #[serde(default)]
    usage: Option<LlmUsage>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible LLM client.
pub struct OpenAiClient {
    /// Base URL, without the trailing `/chat/completions`
    base_url: String,

    /// Bearer token
    api_key: String,

    /// Bound on the time until the response headers arrive
    timeout: Option<Duration>,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client against the public OpenAI API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_OPENAI_URL, api_key)
    }

    /// Create a client against a custom OpenAI-compatible endpoint.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout: None,
            client: reqwest::Client::new(),
        }
    }

    /// Bound every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn to_chat_request<'a>(&self, request: &'a LlmRequest, stream: bool) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatRequest {
            model: &request.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
        }
    }

    async fn send(&self, body: &ChatRequest<'_>) -> AppResult<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);

        let pending = self.client.post(&url).bearer_auth(&self.api_key).json(body).send();

        let response = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, pending).await.map_err(|_| {
                AppError::Llm(format!("Request to {} timed out after {:?}", url, timeout))
            })?,
            None => pending.await,
        }
        .map_err(|e| AppError::Llm(format!("Failed to send request to {}: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Chat completions API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

/// Decode one SSE line into zero or more completion events.
fn parse_sse_line(line: &str) -> AppResult<Vec<CompletionEvent>> {
    let Some(data) = line.strip_prefix("data:") else {
        // Blank separators, comments and `event:`/`id:` fields carry nothing.
        return Ok(Vec::new());
    };
    let data = data.trim();

    if data == "[DONE]" {
        return Ok(vec![CompletionEvent::Done]);
    }

    let chunk: ChatChunk = serde_json::from_str(data)
        .map_err(|e| AppError::Llm(format!("Failed to parse stream chunk: {}", e)))?;

    let mut events = Vec::new();
    for choice in chunk.choices {
        if let Some(role) = choice.delta.role {
            events.push(CompletionEvent::Role(role));
        }
        if let Some(content) = choice.delta.content {
            events.push(CompletionEvent::Content(content));
        }
        if let Some(reason) = choice.finish_reason {
            events.push(CompletionEvent::Finish(reason));
        }
    }

    Ok(events)
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending completion request to {}", self.base_url);
        tracing::debug!("Request: {:?}", request);

        let response = self.send(&self.to_chat_request(request, false)).await?;

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse completion response: {}", e)))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: chat.model,
            usage: chat.usage.unwrap_or_default(),
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<EventStream> {
        tracing::info!("Starting streaming request to {}", self.base_url);
        tracing::debug!("Request: {:?}", request);

        let response = self.send(&self.to_chat_request(request, true)).await?;

        let events = lines(response.bytes_stream()).flat_map(|line| {
            let decoded: Vec<AppResult<CompletionEvent>> =
                match line.and_then(|l| parse_sse_line(&l)) {
                    Ok(events) => events.into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(e)],
                };
            futures::stream::iter(decoded)
        });

        Ok(Box::pin(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_client_creation() {
        let client = OpenAiClient::with_base_url("http://localhost:8000/v1/", "key");
        assert_eq!(client.provider_name(), "openai");
        assert_eq!(client.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn test_chat_request_conversion() {
        let client = OpenAiClient::new("key");
        let request = LlmRequest::new("Hello", "gpt-4o-mini")
            .with_system("be brief")
            .with_temperature(0.2)
            .with_max_tokens(50);

        let body = serde_json::to_value(client.to_chat_request(&request, true)).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 50);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Hello");
    }

    #[test]
    fn test_chat_request_without_system() {
        let client = OpenAiClient::new("key");
        let request = LlmRequest::new("Hello", "gpt-4o-mini");

        let body = serde_json::to_value(client.to_chat_request(&request, false)).unwrap();
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_parse_role_and_content_deltas() {
        let line = r#"data: {"choices":[{"index":0,"delta":{"role":"assistant","content":""},"finish_reason":null}]}"#;
        assert_eq!(
            parse_sse_line(line).unwrap(),
            vec![
                CompletionEvent::Role("assistant".to_string()),
                CompletionEvent::Content(String::new())
            ]
        );

        let line = r#"data: {"choices":[{"index":0,"delta":{"content":"Paris"},"finish_reason":null}]}"#;
        assert_eq!(
            parse_sse_line(line).unwrap(),
            vec![CompletionEvent::Content("Paris".to_string())]
        );
    }

    #[test]
    fn test_parse_finish_and_done() {
        let line = r#"data: {"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#;
        assert_eq!(
            parse_sse_line(line).unwrap(),
            vec![CompletionEvent::Finish("stop".to_string())]
        );
        assert_eq!(parse_sse_line("data: [DONE]").unwrap(), vec![CompletionEvent::Done]);
    }

    #[test]
    fn test_parse_non_data_lines() {
        assert!(parse_sse_line("").unwrap().is_empty());
        assert!(parse_sse_line(": keep-alive").unwrap().is_empty());
        assert!(parse_sse_line("event: message").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_chunk() {
        assert!(parse_sse_line("data: {not json").is_err());
    }
}
