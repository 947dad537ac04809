//! Handler traits and the results they produce
//!
//! Handlers are supplied by the embedding application. A unary handler turns a
//! message into one result; a streaming handler turns it into a stream of
//! results. Plain closures implement both traits.

use std::{fmt, future::Future, time::Duration};

use async_trait::async_trait;
use futures::stream::{BoxStream, Stream};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::{message::Message, Artifact, RESPONSE_ARTIFACT, RESULT_ARTIFACT};

/// Output of one handler invocation or one streamed chunk
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResult {
    /// Becomes an artifact named `response`
    Text(String),

    /// Becomes an artifact named `result` when the value is a JSON object
    Data(Value),
}

impl HandlerResult {
    /// Convert into the artifact appended to the task
    ///
    /// Returns `None` for `Data` that is not a JSON object, which is not a
    /// supported result shape.
    pub fn into_artifact(self) -> Option<Artifact> {
        match self {
            HandlerResult::Text(text) => Some(Artifact::text(RESPONSE_ARTIFACT, text)),
            HandlerResult::Data(Value::Object(data)) => Some(Artifact::data(RESULT_ARTIFACT, data)),
            HandlerResult::Data(_) => None,
        }
    }
}

impl From<String> for HandlerResult {
    fn from(text: String) -> Self {
        HandlerResult::Text(text)
    }
}

impl From<&str> for HandlerResult {
    fn from(text: &str) -> Self {
        HandlerResult::Text(text.to_string())
    }
}

impl From<Value> for HandlerResult {
    fn from(data: Value) -> Self {
        HandlerResult::Data(data)
    }
}

/// Why a handler did not produce a result
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    #[error("handler timed out after {0:?}")]
    Timeout(Duration),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// A plain failure carrying `reason`
    pub fn failed(reason: impl fmt::Display) -> Self {
        HandlerError::Failed(reason.to_string())
    }
}

/// Stream of results produced by a [`StreamingHandler`]
pub type HandlerStream = BoxStream<'static, Result<HandlerResult, HandlerError>>;

/// A handler producing a single result per message
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UnaryHandler: Send + Sync {
    async fn handle(&self, message: Message) -> Result<HandlerResult, HandlerError>;
}

#[async_trait]
impl<F, Fut> UnaryHandler for F
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HandlerResult, HandlerError>> + Send,
{
    async fn handle(&self, message: Message) -> Result<HandlerResult, HandlerError> {
        self(message).await
    }
}

/// A handler producing a stream of results per message
///
/// Each item becomes its own artifact as soon as it is yielded. An `Err` item
/// ends processing of the task.
pub trait StreamingHandler: Send + Sync {
    fn stream(&self, message: Message) -> HandlerStream;
}

impl<F, S> StreamingHandler for F
where
    F: Fn(Message) -> S + Send + Sync,
    S: Stream<Item = Result<HandlerResult, HandlerError>> + Send + 'static,
{
    fn stream(&self, message: Message) -> HandlerStream {
        Box::pin(self(message))
    }
}

/// Identifies a registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(Uuid);

impl HandlerId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
