//! Classify command handler.
//!
//! Shows which strategy the classifier picks without answering.

use super::join_words;
use ask_core::{config::AppConfig, AppError, AppResult};
use ask_llm::create_client_from_config;
use ask_pipeline::QueryClassifier;
use clap::Args;

/// Show how a question would be answered
#[derive(Args, Debug)]
pub struct ClassifyCommand {
    /// The question to classify
    #[arg(required = true)]
    pub question: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ClassifyCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let question = join_words(&self.question)?;
        tracing::info!("Executing classify command");

        let client = create_client_from_config(config)?;
        let classifier = QueryClassifier::new(
            client,
            config.fast_model.clone(),
            config.prompts_dir.clone(),
        );
        let verdict = classifier.classify(&question).await?;

        if self.json {
            let output = serde_json::json!({
                "question": question,
                "classification": verdict.classification,
                "note": verdict.note,
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            if let Some(note) = &verdict.note {
                eprintln!("note: {}", note);
            }
            println!("{}", verdict.classification);
        }

        Ok(())
    }
}
