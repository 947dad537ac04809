//! Core A2A protocol service implementation

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tower_service::Service;

use crate::{
    codec::{jsonrpc::error_codes, Codec, JsonRpcCodec},
    protocol::{error::A2AError, operation::A2AOperation},
    service::{A2ARequest, A2AResponse},
    transport::{Transport, TransportRequest, TransportResponse},
};

/// Tower service executing A2A operations over a transport
pub struct A2AProtocolService<T> {
    transport: T,
    codec: Arc<dyn Codec>,
}

impl<T> A2AProtocolService<T>
where
    T: Transport,
{
    /// Create a new A2A protocol service
    pub fn new(transport: T, codec: Arc<dyn Codec>) -> Self {
        Self { transport, codec }
    }

    fn build_transport_request(
        req: &A2ARequest,
        codec: &dyn Codec,
    ) -> Result<TransportRequest, A2AError> {
        let method = req.operation.method();

        let mut transport_req = TransportRequest::new(req.operation.endpoint(), method)
            .header("Accept", codec.content_type())
            .timeout(req.context.timeout);

        for (key, value) in &req.context.metadata {
            transport_req = transport_req.header(key.clone(), value.clone());
        }

        let body = codec.encode_request(&req.operation)?;
        if !body.is_empty() && method != "GET" {
            transport_req = transport_req
                .header("Content-Type", codec.content_type())
                .body(body);
        }

        Ok(transport_req)
    }

    fn parse_transport_response(
        transport_resp: TransportResponse,
        codec: &dyn Codec,
        operation: &A2AOperation,
    ) -> Result<A2AResponse, A2AError> {
        if !transport_resp.is_success() {
            return Err(Self::handle_error_response(&transport_resp, operation));
        }

        codec.decode_response(&transport_resp.body, operation)
    }

    /// Map a non-2xx response to an error, preferring its JSON-RPC error object
    fn handle_error_response(
        transport_resp: &TransportResponse,
        operation: &A2AOperation,
    ) -> A2AError {
        match JsonRpcCodec::new().decode_error(&transport_resp.body) {
            Some(error) if error.code == error_codes::TASK_NOT_FOUND => A2AError::TaskNotFound {
                task_id: operation.task_id().unwrap_or_default().to_string(),
            },
            Some(error) => error.into(),
            None => A2AError::Transport(format!("HTTP error: {}", transport_resp.status)),
        }
    }
}

impl<T> Service<A2ARequest> for A2AProtocolService<T>
where
    T: Transport + Clone,
{
    type Response = A2AResponse;
    type Error = A2AError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.transport.poll_ready(cx)
    }

    fn call(&mut self, req: A2ARequest) -> Self::Future {
        let transport = self.transport.clone();
        let codec = self.codec.clone();

        Box::pin(async move {
            let transport_req = Self::build_transport_request(&req, codec.as_ref())?;

            if req.operation.is_streaming() {
                let events = transport.execute_streaming(transport_req).await?;
                return Ok(A2AResponse::Stream(events));
            }

            let transport_resp = transport.execute(transport_req).await?;
            Self::parse_transport_response(transport_resp, codec.as_ref(), &req.operation)
        })
    }
}

impl<T> Clone for A2AProtocolService<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            codec: self.codec.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::StreamExt;
    use serde_json::json;

    use crate::{
        codec::jsonrpc::JsonRpcResponse,
        protocol::{
            message::Message,
            task::{Task, TaskQueryParams, TaskSendParams},
        },
        service::RequestContext,
        transport::mock::MockTransport,
    };

    use super::*;

    fn service(transport: MockTransport) -> A2AProtocolService<MockTransport> {
        A2AProtocolService::new(transport, Arc::new(JsonRpcCodec::new()))
    }

    #[tokio::test]
    async fn test_service_send_task() {
        let transport = MockTransport::new(|req| {
            assert_eq!(req.method, "POST");
            assert_eq!(req.endpoint, "");
            let task = Task::new("task-123", "s", Message::user("Test"));
            let json = serde_json::to_vec(&JsonRpcResponse::success("1", task)).unwrap();
            TransportResponse::new(200).body(Bytes::from(json))
        });

        let operation = A2AOperation::SendTask {
            params: TaskSendParams::new(Message::user("Hello")),
        };
        let request = A2ARequest::new(operation, RequestContext::default());

        let response = service(transport).call(request).await.unwrap();
        assert_eq!(response.into_task().unwrap().id, "task-123");
    }

    #[tokio::test]
    async fn test_service_task_not_found() {
        let transport = MockTransport::new(|_req| {
            let body = json!({
                "jsonrpc": "2.0", "id": "1",
                "error": {"code": -32001, "message": "Task not found"}
            });
            TransportResponse::new(400).body(Bytes::from(body.to_string()))
        });

        let operation = A2AOperation::GetTask {
            params: TaskQueryParams::new("task-123"),
        };
        let request = A2ARequest::new(operation, RequestContext::default());

        match service(transport).call(request).await {
            Err(A2AError::TaskNotFound { task_id }) => assert_eq!(task_id, "task-123"),
            other => panic!("Expected TaskNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_service_plain_http_error() {
        let transport = MockTransport::new(|_req| TransportResponse::new(502));

        let request = A2ARequest::new(A2AOperation::DiscoverAgent, RequestContext::default());
        let result = service(transport).call(request).await;

        assert!(matches!(result, Err(A2AError::Transport(_))));
    }

    #[tokio::test]
    async fn test_service_streaming() {
        let transport = MockTransport::new(|_req| {
            let frame = json!({
                "jsonrpc": "2.0", "id": "1",
                "result": {
                    "id": "t",
                    "status": {"state": "completed", "timestamp": "2024-01-01T00:00:00Z"},
                    "final": true
                }
            });
            TransportResponse::new(200).body(Bytes::from(format!("data: {}\n\n", frame)))
        });

        let operation = A2AOperation::SendTaskStreaming {
            params: TaskSendParams::new(Message::user("Hello")),
        };
        let request = A2ARequest::new(operation, RequestContext::default());

        let events: Vec<_> = service(transport)
            .call(request)
            .await
            .unwrap()
            .into_stream()
            .unwrap()
            .collect()
            .await;
        assert_eq!(events.len(), 1);
        assert!(events[0].as_ref().unwrap().is_final());
    }
}
