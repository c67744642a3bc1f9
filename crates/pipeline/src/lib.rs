//! Query routing and retrieval-augmented answering.
//!
//! A query is classified by the model, then answered directly, through a
//! web search whose pages are ranked and fed back to the model, or through
//! an image search whose thumbnails are rendered.

pub mod classification;
pub mod classifier;
pub mod orchestrator;
pub mod pump;
pub mod rewriter;
pub mod sink;

#[cfg(test)]
mod test_support;

pub use classification::Classification;
pub use classifier::{QueryClassifier, Verdict};
pub use orchestrator::{
    Clock, OrchestratorSettings, PipelineState, RunOutcome, SearchOrchestrator, SourcePassage,
};
pub use pump::{spawn_fragment_pump, PumpEvent, PumpHandle};
pub use rewriter::QueryRewriter;
pub use sink::{MemorySink, OutputSink};
