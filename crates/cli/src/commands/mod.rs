//! Command handlers for the ask CLI.

pub mod classify;
pub mod fetch;
pub mod query;

pub use classify::ClassifyCommand;
pub use fetch::FetchCommand;
pub use query::QueryCommand;

/// Join positional words into one question.
pub(crate) fn join_words(words: &[String]) -> ask_core::AppResult<String> {
    let question = words.join(" ");
    if question.trim().is_empty() {
        return Err(ask_core::AppError::Config("No question provided".to_string()));
    }
    Ok(question)
}
