//! Transport abstraction for the A2A client

pub mod http;
#[cfg(test)]
pub mod mock;

use std::{
    collections::HashMap,
    task::{Context, Poll},
    time::Duration,
};

pub use http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::{codec::sse::TaskResponseStream, protocol::error::A2AError};

/// Protocol-agnostic transport request
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Path relative to the agent URL; empty targets the agent URL itself
    pub endpoint: String,

    /// HTTP method (e.g., "POST", "GET")
    pub method: String,

    pub headers: HashMap<String, String>,

    pub body: Bytes,

    /// Per-request timeout
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    /// Create a new transport request
    pub fn new(endpoint: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: method.into(),
            headers: HashMap::new(),
            body: Bytes::new(),
            timeout: None,
        }
    }

    /// Add a header to the request
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the request body
    pub fn body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Bound the whole request
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Protocol-agnostic transport response
#[derive(Debug)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,

    pub headers: HashMap<String, String>,

    pub body: Bytes,
}

impl TransportResponse {
    /// Create a new transport response
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Add a header to the response
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the response body
    pub fn body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Check if the response indicates success (2xx status code)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Core transport trait for executing requests against an agent
#[async_trait]
pub trait Transport: Clone + Send + Sync + 'static {
    /// Check if the transport is ready to accept requests
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), A2AError>>;

    /// Execute a request and collect the whole response
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, A2AError>;

    /// Execute a request whose response is a stream of task events
    async fn execute_streaming(
        &self,
        _request: TransportRequest,
    ) -> Result<TaskResponseStream, A2AError> {
        Err(A2AError::Transport(
            "Streaming is not supported by this transport".into(),
        ))
    }

    /// The agent URL every endpoint is resolved against
    fn base_url(&self) -> &Url;

    /// Check if this transport supports streaming responses
    fn supports_streaming(&self) -> bool {
        false
    }
}
