//! Prompt definitions and their rendered form.

use serde::{Deserialize, Serialize};

/// One prompt as written in YAML: a system text and a user template, both
/// rendered with Handlebars.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDefinition {
    /// Dotted identifier such as `ask.classify`
    pub id: String,

    pub title: String,

    /// Schema version, `major.minor`
    pub api_version: String,

    #[serde(default)]
    pub created_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Template of the user message
    pub template: String,
}

/// A prompt rendered against a context, ready to become an `LlmRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    pub system: Option<String>,
    pub user: String,
    pub metadata: BuiltPromptMetadata,
}

/// Where a built prompt came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltPromptMetadata {
    pub source_prompt_id: String,

    /// The context value the templates were rendered against
    pub resolved_variables: serde_json::Value,
}

impl BuiltPrompt {
    pub fn new(
        system: Option<String>,
        user: String,
        source_prompt_id: String,
        resolved_variables: serde_json::Value,
    ) -> Self {
        Self {
            system,
            user,
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                resolved_variables,
            },
        }
    }
}
