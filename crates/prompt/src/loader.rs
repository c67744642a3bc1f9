//! Prompt loader for YAML prompt definitions.
//!
//! Every prompt the pipeline needs ships inside the binary. A directory of
//! `<id>.yml` files may override any of them.

use crate::types::PromptDefinition;
use ask_core::{AppError, AppResult};
use std::path::Path;

/// Prompts compiled into the binary, keyed by id.
const BUILTIN_PROMPTS: [(&str, &str); 4] = [
    ("ask.direct", include_str!("../prompts/ask.direct.yml")),
    ("ask.classify", include_str!("../prompts/ask.classify.yml")),
    ("ask.rewrite", include_str!("../prompts/ask.rewrite.yml")),
    ("ask.synthesize", include_str!("../prompts/ask.synthesize.yml")),
];

/// Load a prompt definition by ID.
///
/// Looks for `<overrides_dir>/<id>.yml` first and falls back to the
/// built-in definition.
///
/// # Example
/// ```
/// use ask_prompt::load_prompt;
///
/// let prompt = load_prompt(None, "ask.classify").unwrap();
/// assert_eq!(prompt.id, "ask.classify");
/// ```
pub fn load_prompt(overrides_dir: Option<&Path>, prompt_id: &str) -> AppResult<PromptDefinition> {
    if let Some(dir) = overrides_dir {
        let prompt_file = dir.join(format!("{}.yml", prompt_id));
        if prompt_file.exists() {
            tracing::debug!("Loading prompt override from: {:?}", prompt_file);

            let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to read prompt file {:?}: {}",
                    prompt_file, e
                ))
            })?;
            return parse_prompt(&contents, &format!("{:?}", prompt_file));
        }
    }

    let (_, contents) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))?;

    parse_prompt(contents, prompt_id)
}

/// List every available prompt ID, built-in and overrides, sorted.
pub fn list_prompts(overrides_dir: Option<&Path>) -> AppResult<Vec<String>> {
    let mut prompt_ids: Vec<String> = BUILTIN_PROMPTS
        .iter()
        .map(|(id, _)| id.to_string())
        .collect();

    if let Some(dir) = overrides_dir.filter(|d| d.exists()) {
        for entry in walkdir::WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    prompt_ids.push(stem.to_string());
                }
            }
        }
    }

    prompt_ids.sort();
    prompt_ids.dedup();
    Ok(prompt_ids)
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e))
    })?;

    validate_prompt(&definition)?;

    tracing::debug!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    // Validate API version format (simple check)
    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, body: &str) {
        fs::write(dir.join(format!("{}.yml", id)), body).unwrap();
    }

    #[test]
    fn test_builtin_prompts_are_valid() {
        for (id, _) in BUILTIN_PROMPTS {
            let prompt = load_prompt(None, id).unwrap();
            assert_eq!(prompt.id, id);
        }
    }

    #[test]
    fn test_override_takes_precedence() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "ask.direct",
            "id: ask.direct\ntitle: Custom\napiVersion: \"1.0\"\ntemplate: \"Q: {{question}}\"\n",
        );

        let prompt = load_prompt(Some(temp_dir.path()), "ask.direct").unwrap();
        assert_eq!(prompt.title, "Custom");
        assert!(prompt.system.is_none());

        // Prompts without an override still resolve
        let classify = load_prompt(Some(temp_dir.path()), "ask.classify").unwrap();
        assert_eq!(classify.id, "ask.classify");
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_prompt(Some(temp_dir.path()), "nonexistent").is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "ask.rewrite", "invalid: yaml: content:");

        assert!(load_prompt(Some(temp_dir.path()), "ask.rewrite").is_err());
    }

    #[test]
    fn test_invalid_api_version() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "custom",
            "id: custom\ntitle: Custom\napiVersion: \"1\"\ntemplate: x\n",
        );

        assert!(load_prompt(Some(temp_dir.path()), "custom").is_err());
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "ask.direct", "unused");
        write_prompt(temp_dir.path(), "extra", "unused");

        let prompts = list_prompts(Some(temp_dir.path())).unwrap();
        assert_eq!(
            prompts,
            vec!["ask.classify", "ask.direct", "ask.rewrite", "ask.synthesize", "extra"]
        );
    }
}
