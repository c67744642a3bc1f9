//! Tick-driven forwarding of answer fragments to a UI-owning task.
//!
//! A windowed consumer cannot block its event loop on the model. The pump
//! owns the [`StreamingCompletion`], pulls at most one fragment per tick
//! and sends it over a channel that the UI side drains on its own turn.

use ask_llm::StreamingCompletion;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// What the pump forwards to the UI side.
#[derive(Debug, Clone, PartialEq)]
pub enum PumpEvent {
    /// Next piece of answer text
    Fragment(String),

    /// The stream failed; nothing follows
    Failed(String),

    /// The stream is exhausted; nothing follows
    Done,
}

/// Handle to a running pump.
pub struct PumpHandle {
    task: JoinHandle<()>,
}

impl PumpHandle {
    /// Stop rescheduling. Fragments already sent stay in the channel.
    pub fn stop(&self) {
        self.task.abort();
    }

    /// Wait for the pump to end.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                tracing::warn!("Fragment pump ended abnormally: {}", e);
            }
        }
    }
}

/// Spawn a task that forwards one fragment of `completion` per `tick`.
///
/// The pump ends after sending `Done` or `Failed`, or as soon as the
/// receiving side is dropped.
pub fn spawn_fragment_pump(
    mut completion: StreamingCompletion,
    tick: Duration,
    tx: mpsc::UnboundedSender<PumpEvent>,
) -> PumpHandle {
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let (event, last) = match completion.next().await {
                Some(Ok(fragment)) => (PumpEvent::Fragment(fragment), false),
                Some(Err(e)) => (PumpEvent::Failed(e.to_string()), true),
                None => (PumpEvent::Done, true),
            };

            if tx.send(event).is_err() {
                tracing::debug!("Fragment receiver dropped, stopping pump");
                return;
            }
            if last {
                return;
            }
        }
    });

    PumpHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ask_core::AppError;
    use ask_llm::CompletionEvent;

    fn completion(events: Vec<Result<CompletionEvent, AppError>>) -> StreamingCompletion {
        StreamingCompletion::from_events(Box::pin(futures::stream::iter(events)))
    }

    async fn drain(mut rx: mpsc::UnboundedReceiver<PumpEvent>) -> Vec<PumpEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_pump_forwards_fragments_then_done() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = spawn_fragment_pump(
            completion(vec![
                Ok(CompletionEvent::Role("assistant".to_string())),
                Ok(CompletionEvent::Content("Par".to_string())),
                Ok(CompletionEvent::Content("is".to_string())),
                Ok(CompletionEvent::Done),
            ]),
            Duration::from_millis(1),
            tx,
        );

        let events = drain(rx).await;
        handle.join().await;

        assert_eq!(
            events,
            vec![
                PumpEvent::Fragment("Par".to_string()),
                PumpEvent::Fragment("is".to_string()),
                PumpEvent::Done
            ]
        );
    }

    #[tokio::test]
    async fn test_pump_reports_failure() {
        let (tx, rx) = mpsc::unbounded_channel();
        spawn_fragment_pump(
            completion(vec![
                Ok(CompletionEvent::Content("partial".to_string())),
                Err(AppError::Llm("connection reset".to_string())),
            ]),
            Duration::from_millis(1),
            tx,
        );

        let events = drain(rx).await;
        assert_eq!(events[0], PumpEvent::Fragment("partial".to_string()));
        assert!(matches!(&events[1], PumpEvent::Failed(msg) if msg.contains("connection reset")));
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_stop_cancels_pending_pump() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_fragment_pump(
            StreamingCompletion::from_events(Box::pin(futures::stream::pending::<
                Result<CompletionEvent, AppError>,
            >())),
            Duration::from_millis(1),
            tx,
        );

        handle.stop();
        // The sender is dropped with the aborted task
        assert_eq!(rx.recv().await, None);
    }
}
