//! Prompt system for the ask pipeline.
//!
//! This crate provides structured prompt management with:
//! - YAML prompt definitions compiled into the binary
//! - Optional per-id overrides from a directory
//! - Handlebars rendering against any serializable context

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{list_prompts, load_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
