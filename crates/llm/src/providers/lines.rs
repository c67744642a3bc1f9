//! Re-splitting of HTTP body chunks into text lines.
//!
//! Both SSE and NDJSON bodies are line oriented, but the transport delivers
//! arbitrary byte chunks: a line may span several chunks and a chunk may
//! hold several lines.

use ask_core::{AppError, AppResult};
use futures::{Stream, StreamExt};
use std::fmt::Display;

struct LineState<S> {
    inner: S,
    buf: Vec<u8>,
    exhausted: bool,
}

/// Turn a stream of byte chunks into a stream of lines without their
/// terminators. A trailing line without a newline is still emitted.
pub(crate) fn lines<S, B, E>(chunks: S) -> impl Stream<Item = AppResult<String>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + Unpin,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    let state = LineState {
        inner: chunks,
        buf: Vec::new(),
        exhausted: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(pos) = state.buf.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = state.buf.drain(..=pos).collect();
                return Some((Ok(decode(&line)), state));
            }

            if state.exhausted {
                if state.buf.is_empty() {
                    return None;
                }
                let rest = std::mem::take(&mut state.buf);
                return Some((Ok(decode(&rest)), state));
            }

            match state.inner.next().await {
                Some(Ok(chunk)) => state.buf.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    state.exhausted = true;
                    state.buf.clear();
                    return Some((Err(AppError::Llm(format!("Stream error: {}", e))), state));
                }
                None => state.exhausted = true,
            }
        }
    })
}

fn decode(line: &[u8]) -> String {
    String::from_utf8_lossy(line)
        .trim_end_matches(|c| c == '\n' || c == '\r')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, String>> + Send + Unpin {
        let owned: Vec<Result<Vec<u8>, String>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        futures::stream::iter(owned)
    }

    #[tokio::test]
    async fn test_line_split_across_chunks() {
        let out: Vec<String> = lines(chunks(&["data: {\"a\"", ":1}\n\ndata: [DO", "NE]\n"]))
            .map(|l| l.unwrap())
            .collect()
            .await;

        assert_eq!(out, vec!["data: {\"a\":1}", "", "data: [DONE]"]);
    }

    #[tokio::test]
    async fn test_many_lines_in_one_chunk_and_trailing_line() {
        let out: Vec<String> = lines(chunks(&["one\r\ntwo\nthree"]))
            .map(|l| l.unwrap())
            .collect()
            .await;

        assert_eq!(out, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_chunks() {
        let bytes = "é\n".as_bytes();
        let parts: Vec<Result<Vec<u8>, String>> =
            vec![Ok(bytes[..1].to_vec()), Ok(bytes[1..].to_vec())];

        let out: Vec<String> = lines(futures::stream::iter(parts))
            .map(|l| l.unwrap())
            .collect()
            .await;

        assert_eq!(out, vec!["é"]);
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let parts: Vec<Result<Vec<u8>, String>> =
            vec![Ok(b"ok\npart".to_vec()), Err("reset".to_string()), Ok(b"x\n".to_vec())];

        let out: Vec<AppResult<String>> = lines(futures::stream::iter(parts)).collect().await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_ref().unwrap(), "ok");
        assert!(out[1].is_err());
    }
}
