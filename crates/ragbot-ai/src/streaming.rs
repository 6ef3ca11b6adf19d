//! Server-Sent Events (SSE) decoding.
//!
//! Vertex AI's `streamGenerateContent?alt=sse` answers with an SSE body.
//! The decoder turns any buffered byte source into a finite stream of
//! events so callers can forward fragments as they arrive.

use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio_util::io::StreamReader;

use crate::AiError;

/// A single SSE event parsed from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The event type, if the server sent one.
    pub event: Option<String>,
    /// The event data (JSON string for Vertex AI).
    pub data: String,
}

struct DecoderState<R> {
    lines: Lines<R>,
    event: Option<String>,
    data: String,
    done: bool,
}

impl<R> DecoderState<R> {
    fn take_event(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        Some(SseEvent {
            event,
            data: std::mem::take(&mut self.data),
        })
    }
}

/// Decode SSE events from a buffered reader.
pub fn decode_sse<R>(reader: R) -> BoxStream<'static, Result<SseEvent, AiError>>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let state = DecoderState {
        lines: reader.lines(),
        event: None,
        data: String::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }
        loop {
            match state.lines.next_line().await {
                Ok(Some(line)) => {
                    if line.is_empty() {
                        // Blank line terminates the event
                        if let Some(event) = state.take_event() {
                            return Some((Ok(event), state));
                        }
                        continue;
                    }
                    if let Some(event_type) = line.strip_prefix("event:") {
                        state.event = Some(event_type.trim_start().to_string());
                    } else if let Some(data) = line.strip_prefix("data:") {
                        let data = data.strip_prefix(' ').unwrap_or(data);
                        if !state.data.is_empty() {
                            state.data.push('\n');
                        }
                        state.data.push_str(data);
                    }
                    // id:, retry: and comments are ignored
                }
                Ok(None) => {
                    state.done = true;
                    return state.take_event().map(|event| (Ok(event), state));
                }
                Err(e) => {
                    state.done = true;
                    return Some((Err(AiError::NetworkError(e.to_string())), state));
                }
            }
        }
    })
    .boxed()
}

/// Decode SSE events from a reqwest response body.
pub fn response_events(response: reqwest::Response) -> BoxStream<'static, Result<SseEvent, AiError>> {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other))
        .boxed();
    decode_sse(BufReader::new(StreamReader::new(byte_stream)))
}
