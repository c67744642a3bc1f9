//! Lazy stream of answer text over a provider's raw completion events.

use crate::client::{CompletionEvent, EventStream, LlmClient, LlmRequest};
use ask_core::AppResult;
use futures::future::BoxFuture;
use futures::{FutureExt, Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Text fragments of a single model call.
///
/// The request is not sent until the stream is first polled. Events that
/// carry no text (role declarations, finish reasons, end markers, empty
/// deltas) are skipped. After exhaustion or the first error the stream
/// only yields `None`; it is never resumed.
pub struct StreamingCompletion {
    state: State,
}

enum State {
    Connecting(BoxFuture<'static, AppResult<EventStream>>),
    Streaming(EventStream),
    Finished,
}

impl StreamingCompletion {
    /// Prepare a streaming call of `request` against `client`.
    pub fn new(client: Arc<dyn LlmClient>, request: LlmRequest) -> Self {
        let connect = async move {
            tracing::debug!(
                "Opening completion stream (provider: {}, model: {})",
                client.provider_name(),
                request.model
            );
            client.stream(&request).await
        }
        .boxed();

        Self {
            state: State::Connecting(connect),
        }
    }

    /// Wrap an already open event stream.
    pub fn from_events(events: EventStream) -> Self {
        Self {
            state: State::Streaming(events),
        }
    }

    /// Drain the stream and concatenate every fragment.
    pub async fn collect_text(mut self) -> AppResult<String> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

impl Stream for StreamingCompletion {
    type Item = AppResult<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            match &mut this.state {
                State::Connecting(connect) => match connect.as_mut().poll(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Ok(events)) => this.state = State::Streaming(events),
                    Poll::Ready(Err(e)) => {
                        this.state = State::Finished;
                        return Poll::Ready(Some(Err(e)));
                    }
                },
                State::Streaming(events) => match events.as_mut().poll_next(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(None) => {
                        this.state = State::Finished;
                        return Poll::Ready(None);
                    }
                    Poll::Ready(Some(Err(e))) => {
                        this.state = State::Finished;
                        return Poll::Ready(Some(Err(e)));
                    }
                    Poll::Ready(Some(Ok(CompletionEvent::Content(text)))) if !text.is_empty() => {
                        return Poll::Ready(Some(Ok(text)));
                    }
                    Poll::Ready(Some(Ok(event))) => {
                        tracing::trace!("Skipping non-content event: {:?}", event);
                    }
                },
                State::Finished => return Poll::Ready(None),
            }
        }
    }
}
