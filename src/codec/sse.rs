//! Server-Sent Events framing for streamed task events
//!
//! Each event travels as its own JSON-RPC response in a single `data:` frame.
//! The server encodes frames with [`SseCodec::encode`]; the client turns a
//! response body back into events with [`SseCodec::parse_stream`].

use std::fmt;

use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures::stream::{self, BoxStream, Stream, StreamExt};

use crate::{
    codec::jsonrpc::SendTaskStreamingResponse,
    protocol::{
        error::{A2AError, A2AResult},
        task::TaskStreamEvent,
    },
};

/// Content type of a streaming response
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Decoded events of a streaming response
pub type TaskResponseStream = BoxStream<'static, A2AResult<TaskStreamEvent>>;

/// SSE codec for streamed task events
#[derive(Debug, Clone, Default)]
pub struct SseCodec;

impl SseCodec {
    /// Create a new SSE codec
    pub fn new() -> Self {
        Self
    }

    /// Serialize one frame into the payload of an SSE `data:` line
    pub fn encode(&self, frame: &SendTaskStreamingResponse) -> A2AResult<String> {
        Ok(serde_json::to_string(frame)?)
    }

    /// Decode one `data:` payload
    ///
    /// JSON-RPC error frames become `A2AError::JsonRpc`.
    pub fn decode(&self, data: &str) -> A2AResult<TaskStreamEvent> {
        let frame: SendTaskStreamingResponse = serde_json::from_str(data)
            .map_err(|e| A2AError::Protocol(format!("Failed to parse SSE event data: {}", e)))?;
        frame.into_result()
    }

    /// Parse an SSE byte stream into task events
    ///
    /// The stream ends after the first event marked final or the first error.
    /// A body that closes before any final event yields a trailing
    /// `A2AError::Transport`, so a truncated stream reads as a failed task.
    pub fn parse_stream<S, E>(&self, byte_stream: S) -> TaskResponseStream
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let codec = self.clone();
        let events = byte_stream
            .eventsource()
            .map(move |result| match result {
                Ok(event) => codec.decode(&event.data),
                Err(e) => Err(A2AError::Transport(format!("SSE stream error: {}", e))),
            })
            .boxed();

        stream::unfold(Some(events), |events| async move {
            let mut events = events?;
            match events.next().await {
                Some(Ok(event)) => {
                    let rest = if event.is_final() { None } else { Some(events) };
                    Some((Ok(event), rest))
                }
                Some(Err(err)) => Some((Err(err), None)),
                None => Some((
                    Err(A2AError::Transport(
                        "stream closed before final event".into(),
                    )),
                    None,
                )),
            }
        })
        .boxed()
    }
}
