//! Model-driven choice of answering strategy.

use crate::classification::Classification;
use ask_core::AppResult;
use ask_llm::{extract_tag, LlmClient, LlmRequest, StreamingCompletion};
use ask_prompt::{build_prompt, load_prompt};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Room for a short deliberation before the tag.
const CLASSIFY_MAX_TOKENS: u32 = 128;

/// What the classifier decided, plus a diagnostic when it had to fall back.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub classification: Classification,
    pub note: Option<String>,
}

#[derive(Serialize)]
struct EngineEntry {
    name: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
struct ClassifyContext<'a> {
    question: &'a str,
    engines: Vec<EngineEntry>,
}

/// Asks the fast model which strategy fits a query.
pub struct QueryClassifier {
    client: Arc<dyn LlmClient>,
    model: String,
    prompts_dir: Option<PathBuf>,
}

impl QueryClassifier {
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

    /// Classify `query` with one full model round-trip.
    ///
    /// Transport and provider failures are returned as errors. A reply
    /// without an `<engine>` tag falls back to `DirectAnswer` with a note.
    pub async fn classify(&self, query: &str) -> AppResult<Verdict> {
        let definition = load_prompt(self.prompts_dir.as_deref(), "ask.classify")?;
        let context = ClassifyContext {
            question: query,
            engines: Classification::ENGINES
                .iter()
                .map(|engine| EngineEntry {
                    name: engine.name(),
                    description: engine.description(),
                })
                .collect(),
        };
        let prompt = build_prompt(&definition, &context)?;

        let mut request = LlmRequest::new(prompt.user, &self.model)
            .with_temperature(0.0)
            .with_max_tokens(CLASSIFY_MAX_TOKENS);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let reply = StreamingCompletion::new(Arc::clone(&self.client), request)
            .collect_text()
            .await?;
        tracing::debug!("Classifier reply: {:?}", reply);

        Ok(interpret(&reply))
    }
}

/// Turn a classifier reply into a verdict.
pub fn interpret(reply: &str) -> Verdict {
    match extract_tag(reply, "engine") {
        Some(name) => Verdict {
            classification: Classification::from_name(name),
            note: None,
        },
        None => {
            tracing::warn!("Classifier reply had no <engine> tag, answering directly");
            Verdict {
                classification: Classification::DirectAnswer,
                note: Some(format!(
                    "Could not classify the query, falling back to {}",
                    Classification::DirectAnswer
                )),
            }
        }
    }
}
