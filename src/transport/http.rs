//! HTTP transport implementation using reqwest

use std::task::{Context, Poll};

use async_trait::async_trait;
use url::Url;

use crate::{
    codec::sse::{SseCodec, TaskResponseStream, EVENT_STREAM_CONTENT_TYPE},
    codec::JsonRpcCodec,
    protocol::error::A2AError,
};

use super::{Transport, TransportRequest, TransportResponse};

/// HTTP transport implementing the JSON-RPC over HTTP binding
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a new HTTP transport
    ///
    /// # Arguments
    ///
    /// * `base_url` - The agent URL (e.g., "<http://localhost:8000/>")
    pub fn new(base_url: Url) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a new HTTP transport with a custom reqwest client
    pub fn with_client(base_url: Url, client: reqwest::Client) -> Self {
        Self { client, base_url }
    }

    /// Resolve an endpoint against the agent URL
    ///
    /// An empty endpoint is the agent URL itself; absolute paths replace the
    /// agent URL's path.
    pub fn resolve(&self, endpoint: &str) -> Result<Url, A2AError> {
        if endpoint.is_empty() {
            return Ok(self.base_url.clone());
        }
        self.base_url
            .join(endpoint)
            .map_err(|e| A2AError::Transport(format!("Invalid endpoint {}: {}", endpoint, e)))
    }

    fn build(&self, request: TransportRequest) -> Result<reqwest::RequestBuilder, A2AError> {
        let url = self.resolve(&request.endpoint)?;

        let mut req_builder = match request.method.as_str() {
            "POST" => self.client.post(url),
            "GET" => self.client.get(url),
            _ => {
                return Err(A2AError::Transport(format!(
                    "Unsupported HTTP method: {}",
                    request.method
                )))
            }
        };

        for (key, value) in request.headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(timeout) = request.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        if !request.body.is_empty() {
            req_builder = req_builder.body(request.body);
        }

        Ok(req_builder)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), A2AError>> {
        // HTTP client is always ready
        Poll::Ready(Ok(()))
    }

    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, A2AError> {
        let response = self.build(request)?.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body = response.bytes().await?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    async fn execute_streaming(
        &self,
        mut request: TransportRequest,
    ) -> Result<TaskResponseStream, A2AError> {
        // The overall timeout would cut long streams short
        request.timeout = None;
        let response = self
            .build(request)?
            .header("Accept", EVENT_STREAM_CONTENT_TYPE)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.bytes().await.unwrap_or_default();
            if let Some(error) = JsonRpcCodec::new().decode_error(&body) {
                return Err(error.into());
            }
            return Err(A2AError::Transport(format!(
                "HTTP streaming request failed with status {}",
                status
            )));
        }

        Ok(SseCodec::new().parse_stream(response.bytes_stream()))
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}
