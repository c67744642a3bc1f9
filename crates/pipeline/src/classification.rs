//! The closed set of answering strategies.

use serde::Serialize;
use std::fmt;

/// How a query is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// Answer from the model alone
    DirectAnswer,

    /// Search the web, rank fetched pages, then synthesize an answer
    WebSearch,

    /// Search for images and render their thumbnails
    ImageSearch,

    /// The model named something outside the set
    Unknown,
}

impl Classification {
    /// Strategies offered to the classifier, in prompt order.
    pub const ENGINES: [Classification; 3] = [
        Classification::DirectAnswer,
        Classification::WebSearch,
        Classification::ImageSearch,
    ];

    /// Name used in prompts, on the command line and in `<engine>` tags.
    pub fn name(&self) -> &'static str {
        match self {
            Classification::DirectAnswer => "direct-answer",
            Classification::WebSearch => "web-search",
            Classification::ImageSearch => "image-search",
            Classification::Unknown => "unknown",
        }
    }

    /// One-line description shown to the classifier.
    pub fn description(&self) -> &'static str {
        match self {
            Classification::DirectAnswer => {
                "general knowledge, reasoning, writing or code that the model can answer on its own"
            }
            Classification::WebSearch => {
                "recent events, prices, schedules or facts that need current web pages"
            }
            Classification::ImageSearch => "requests to see pictures or images of something",
            Classification::Unknown => "no matching strategy",
        }
    }

    /// Map an engine name to a strategy. Case and surrounding whitespace
    /// are ignored; anything outside [`Self::ENGINES`] is `Unknown`.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        Self::ENGINES
            .into_iter()
            .find(|engine| engine.name() == name)
            .unwrap_or(Classification::Unknown)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
