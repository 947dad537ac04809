use std::{
    sync::Arc,
    task::{Context, Poll},
};

use async_trait::async_trait;
use url::Url;

use crate::{
    codec::{sse::TaskResponseStream, SseCodec},
    protocol::error::A2AError,
    transport::{Transport, TransportRequest, TransportResponse},
};

/// Mock transport for unit tests
///
/// Every request is answered by the supplied closure. Streaming requests
/// run the closure too and parse its body as an SSE stream.
#[derive(Clone)]
pub(crate) struct MockTransport {
    handler: Arc<dyn Fn(TransportRequest) -> TransportResponse + Send + Sync>,
    base_url: Url,
}

impl MockTransport {
    /// Create a new mock transport with a custom request handler
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(TransportRequest) -> TransportResponse + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            base_url: Url::parse("http://mock.local/").expect("static url"),
        }
    }

    /// A mock transport that always returns 200 OK
    pub fn ok() -> Self {
        Self::new(|_| TransportResponse::new(200))
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), A2AError>> {
        Poll::Ready(Ok(()))
    }

    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, A2AError> {
        Ok((self.handler)(request))
    }

    async fn execute_streaming(
        &self,
        request: TransportRequest,
    ) -> Result<TaskResponseStream, A2AError> {
        let body = (self.handler)(request).body;
        let chunks = futures::stream::iter([Ok::<_, std::convert::Infallible>(body)]);
        Ok(SseCodec::new().parse_stream(chunks))
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport").finish()
    }
}
