//! Prompt builder for rendering templates against a context.

use crate::types::{BuiltPrompt, PromptDefinition};
use ask_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde::Serialize;

/// Build a prompt from a definition and a rendering context.
///
/// Both the system message (when the definition has one) and the user
/// template are rendered with Handlebars against `context`. Missing
/// variables render as empty strings.
///
/// # Example
/// ```
/// use ask_prompt::{build_prompt, load_prompt};
/// use serde_json::json;
///
/// let def = load_prompt(None, "ask.direct").unwrap();
/// let built = build_prompt(&def, &json!({ "question": "What is Rust?" })).unwrap();
/// assert_eq!(built.user, "What is Rust?");
/// ```
pub fn build_prompt<C: Serialize>(
    definition: &PromptDefinition,
    context: &C,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let variables = serde_json::to_value(context)?;

    let system = definition
        .system
        .as_deref()
        .map(|template| render_template(template, &variables))
        .transpose()?;
    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &serde_json::Value) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
