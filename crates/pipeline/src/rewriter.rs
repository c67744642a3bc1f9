//! Rewriting of questions into search-engine keywords.

use ask_core::{AppError, AppResult};
use ask_llm::{extract_tag, LlmClient, LlmRequest, StreamingCompletion};
use ask_prompt::{build_prompt, load_prompt};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

const REWRITE_MAX_TOKENS: u32 = 128;

#[derive(Serialize)]
struct RewriteContext<'a> {
    question: &'a str,
    timestamp: &'a str,
}

/// Asks the fast model for a keyword query.
pub struct QueryRewriter {
    client: Arc<dyn LlmClient>,
    model: String,
    prompts_dir: Option<PathBuf>,
}

impl QueryRewriter {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        prompts_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            prompts_dir,
        }
    }

    /// Rewrite `query`, given the current time as an ISO 8601 string.
    ///
    /// Returns [`AppError::Extraction`] when the reply has no non-empty
    /// `<search>` tag; choosing a fallback is up to the caller.
    pub async fn rewrite(&self, query: &str, timestamp: &str) -> AppResult<String> {
        let definition = load_prompt(self.prompts_dir.as_deref(), "ask.rewrite")?;
        let prompt = build_prompt(
            &definition,
            &RewriteContext {
                question: query,
                timestamp,
            },
        )?;

        let mut request = LlmRequest::new(prompt.user, &self.model)
            .with_temperature(0.0)
            .with_max_tokens(REWRITE_MAX_TOKENS);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let reply = StreamingCompletion::new(Arc::clone(&self.client), request)
            .collect_text()
            .await?;
        tracing::debug!("Rewriter reply: {:?}", reply);

        match extract_tag(&reply, "search").map(str::trim) {
            Some(rewritten) if !rewritten.is_empty() => Ok(rewritten.to_string()),
            _ => Err(AppError::Extraction(
                "Rewriter reply had no <search> tag".to_string(),
            )),
        }
    }
}
