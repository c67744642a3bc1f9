//! Destinations for answer text and diagnostics.

use ask_core::AppResult;

/// Receives the pipeline's output in arrival order.
///
/// Answer text goes to [`append`](OutputSink::append) fragment by fragment;
/// side notes for the operator go to [`note`](OutputSink::note).
/// [`done`](OutputSink::done) is called once, after a query completes.
pub trait OutputSink: Send {
    fn append(&mut self, fragment: &str) -> AppResult<()>;

    fn note(&mut self, message: &str) -> AppResult<()>;

    fn done(&mut self) -> AppResult<()>;
}

/// Sink that keeps everything in memory.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemorySink {
    pub fragments: Vec<String>,
    pub notes: Vec<String>,
    pub finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All fragments joined together.
    pub fn text(&self) -> String {
        self.fragments.concat()
    }
}

impl OutputSink for MemorySink {
    fn append(&mut self, fragment: &str) -> AppResult<()> {
        self.fragments.push(fragment.to_string());
        Ok(())
    }

    fn note(&mut self, message: &str) -> AppResult<()> {
        self.notes.push(message.to_string());
        Ok(())
    }

    fn done(&mut self) -> AppResult<()> {
        self.finished = true;
        Ok(())
    }
}
