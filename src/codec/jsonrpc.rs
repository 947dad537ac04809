//! JSON-RPC 2.0 envelope for the A2A task protocol
//!
//! The server side decodes raw request bodies into [`A2AOperation`]s and
//! builds response envelopes; the client side implements [`Codec`] on top of
//! the same types.

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    codec::Codec,
    protocol::{
        error::A2AError,
        operation::{methods, A2AOperation},
        task::{Task, TaskStreamEvent},
    },
    server::registry::RegistryError,
    service::response::A2AResponse,
};

/// Protocol version carried by every envelope
pub const JSONRPC_VERSION: &str = "2.0";

/// Fixed JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const TASK_NOT_FOUND: i64 = -32001;
}

/// Generate a fresh correlation id
pub fn new_request_id() -> String {
    Uuid::now_v7().to_string()
}

/// Recover a usable correlation id from an inbound `id` value
///
/// Strings are kept when non-empty and numbers are rendered as strings.
/// Anything else is unrecoverable.
fn recover_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(recover_id(&value).unwrap_or_default())
}

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,

    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    pub method: String,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Create a request with a fresh id
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: new_request_id(),
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse<T = Value> {
    pub jsonrpc: String,

    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl<T> JsonRpcResponse<T> {
    /// Successful response; an empty id is replaced by a fresh one
    pub fn success(id: impl Into<String>, result: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: non_empty_id(id.into()),
            result: Some(result),
            error: None,
        }
    }

    /// Error response; an empty id is replaced by a fresh one
    pub fn error(id: impl Into<String>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: non_empty_id(id.into()),
            result: None,
            error: Some(error),
        }
    }

    /// Extract the result, turning an error object into `A2AError::JsonRpc`
    pub fn into_result(self) -> Result<T, A2AError> {
        if let Some(error) = self.error {
            return Err(error.into());
        }
        self.result.ok_or_else(|| {
            A2AError::Protocol("JSON-RPC response missing 'result' field".to_string())
        })
    }
}

fn non_empty_id(id: String) -> String {
    if id.is_empty() {
        new_request_id()
    } else {
        id
    }
}

/// Response to `tasks/send` and `tasks/get`
pub type TaskResponse = JsonRpcResponse<Task>;

/// One SSE frame of a `tasks/send/stream` response
pub type SendTaskStreamingResponse = JsonRpcResponse<TaskStreamEvent>;

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured detail
    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn parse_error() -> Self {
        Self::new(error_codes::PARSE_ERROR, "Invalid JSON payload")
    }

    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_REQUEST, "Request payload validation error")
            .with_data(detail.into())
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(error_codes::METHOD_NOT_FOUND, "Method not found").with_data(method)
    }

    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_PARAMS, "Invalid parameters").with_data(detail.into())
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::new(error_codes::INTERNAL_ERROR, detail)
    }

    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(error_codes::TASK_NOT_FOUND, "Task not found").with_data(task_id)
    }
}

impl From<&A2AError> for JsonRpcError {
    fn from(err: &A2AError) -> Self {
        match err {
            A2AError::TaskNotFound { task_id }
            | A2AError::Registry(RegistryError::TaskNotFound { task_id }) => {
                JsonRpcError::task_not_found(task_id)
            }
            A2AError::Registry(err @ RegistryError::DuplicateTask { .. }) => {
                JsonRpcError::invalid_params(err.to_string())
            }
            A2AError::Validation(detail) => JsonRpcError::invalid_params(detail.clone()),
            A2AError::JsonRpc { code, message } => JsonRpcError::new(*code, message.clone()),
            other => JsonRpcError::internal_error(other.to_string()),
        }
    }
}

impl From<JsonRpcError> for A2AError {
    fn from(err: JsonRpcError) -> Self {
        A2AError::JsonRpc {
            code: err.code,
            message: err.message,
        }
    }
}

/// A request rejected before any task was created
///
/// `id` is the recovered correlation id, or a fresh one when the request did
/// not carry a usable id.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRequest {
    pub id: String,
    pub error: JsonRpcError,
}

impl RejectedRequest {
    fn new(id: Option<String>, error: JsonRpcError) -> Self {
        Self {
            id: id.unwrap_or_else(new_request_id),
            error,
        }
    }

    /// The error envelope to send back
    pub fn into_response(self) -> JsonRpcResponse {
        JsonRpcResponse::error(self.id, self.error)
    }
}

/// JSON-RPC 2.0 codec for the A2A task protocol
#[derive(Debug, Clone, Default)]
pub struct JsonRpcCodec;

impl JsonRpcCodec {
    /// Create a new JSON-RPC codec
    pub fn new() -> Self {
        Self
    }

    /// Decode a raw request body into its correlation id and operation
    ///
    /// # Errors
    ///
    /// - `-32700` when the body is not JSON
    /// - `-32600` when it is not an object with a string `method` or carries a
    ///   `jsonrpc` version other than `2.0`
    /// - `-32601` for unknown methods
    /// - `-32602` when `params` do not decode
    pub fn decode_request(&self, body: &[u8]) -> Result<(String, A2AOperation), RejectedRequest> {
        let value: Value = serde_json::from_slice(body).map_err(|err| {
            RejectedRequest::new(None, JsonRpcError::parse_error().with_data(err.to_string()))
        })?;

        let Some(object) = value.as_object() else {
            return Err(RejectedRequest::new(
                None,
                JsonRpcError::invalid_request("Invalid request format"),
            ));
        };
        let id = object.get("id").and_then(recover_id);

        let Some(method) = object.get("method").and_then(Value::as_str) else {
            return Err(RejectedRequest::new(
                id,
                JsonRpcError::invalid_request("Invalid request format"),
            ));
        };

        if let Some(version) = object.get("jsonrpc") {
            if version.as_str() != Some(JSONRPC_VERSION) {
                return Err(RejectedRequest::new(
                    id,
                    JsonRpcError::invalid_request("Invalid JSON-RPC version, expected 2.0"),
                ));
            }
        }

        let id = id.unwrap_or_else(new_request_id);
        let params = object.get("params").cloned().unwrap_or(Value::Null);

        let operation = match method {
            methods::SEND_TASK => A2AOperation::SendTask {
                params: decode_params(&id, params)?,
            },
            methods::SEND_TASK_STREAMING => A2AOperation::SendTaskStreaming {
                params: decode_params(&id, params)?,
            },
            methods::GET_TASK => A2AOperation::GetTask {
                params: decode_params(&id, params)?,
            },
            other => {
                return Err(RejectedRequest::new(
                    Some(id),
                    JsonRpcError::method_not_found(other),
                ))
            }
        };

        Ok((id, operation))
    }

    /// Decode the error object of a JSON-RPC error response, if there is one
    pub fn decode_error(&self, body: &[u8]) -> Option<JsonRpcError> {
        serde_json::from_slice::<JsonRpcResponse>(body)
            .ok()
            .and_then(|response| response.error)
    }
}

fn decode_params<T>(id: &str, params: Value) -> Result<T, RejectedRequest>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(params).map_err(|err| {
        RejectedRequest::new(
            Some(id.to_string()),
            JsonRpcError::invalid_params(err.to_string()),
        )
    })
}

impl Codec for JsonRpcCodec {
    fn encode_request(&self, operation: &A2AOperation) -> Result<Bytes, A2AError> {
        let params = match operation {
            A2AOperation::SendTask { params } | A2AOperation::SendTaskStreaming { params } => {
                serde_json::to_value(params)?
            }
            A2AOperation::GetTask { params } => serde_json::to_value(params)?,
            // The agent card is a plain GET
            A2AOperation::DiscoverAgent => return Ok(Bytes::new()),
        };

        let method = operation.rpc_method().unwrap_or_default();
        let request = JsonRpcRequest::new(method, params);

        let bytes = serde_json::to_vec(&request)?;
        Ok(Bytes::from(bytes))
    }

    fn decode_response(
        &self,
        body: &[u8],
        operation: &A2AOperation,
    ) -> Result<A2AResponse, A2AError> {
        match operation {
            A2AOperation::DiscoverAgent => {
                let card = serde_json::from_slice(body)?;
                Ok(A2AResponse::AgentCard(Box::new(card)))
            }
            A2AOperation::SendTask { .. } | A2AOperation::GetTask { .. } => {
                let response: TaskResponse = serde_json::from_slice(body).map_err(|e| {
                    A2AError::Protocol(format!("Failed to parse JSON-RPC response: {}", e))
                })?;
                Ok(A2AResponse::Task(Box::new(response.into_result()?)))
            }
            A2AOperation::SendTaskStreaming { .. } => Err(A2AError::Protocol(
                "Streaming responses are decoded by the SSE codec".into(),
            )),
        }
    }

    fn content_type(&self) -> &str {
        "application/json"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::protocol::{message::Message, task::TaskSendParams};

    use super::*;

    fn decode(body: Value) -> Result<(String, A2AOperation), RejectedRequest> {
        JsonRpcCodec::new().decode_request(body.to_string().as_bytes())
    }

    fn send_body(method: &str) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": "req-1",
            "method": method,
            "params": {
                "id": "task-1",
                "sessionId": "session-1",
                "message": {"role": "user", "parts": [{"type": "text", "text": "2+2"}]}
            }
        })
    }

    #[test]
    fn test_decode_send_task() {
        let (id, operation) = decode(send_body("tasks/send")).unwrap();
        assert_eq!(id, "req-1");

        match operation {
            A2AOperation::SendTask { params } => {
                assert_eq!(params.id, "task-1");
                assert_eq!(params.session_id, "session-1");
                assert_eq!(params.message.text_content(), "2+2");
            }
            other => panic!("Expected SendTask, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_streaming_and_get() {
        let (_, operation) = decode(send_body("tasks/send/stream")).unwrap();
        assert!(operation.is_streaming());

        let (_, operation) = decode(json!({
            "jsonrpc": "2.0", "id": "r", "method": "tasks/get", "params": {"id": "task-1"}
        }))
        .unwrap();
        assert_eq!(operation.task_id(), Some("task-1"));
    }

    #[test]
    fn test_decode_parse_error_gets_fresh_id() {
        let rejected = JsonRpcCodec::new().decode_request(b"{not json").unwrap_err();
        assert_eq!(rejected.error.code, error_codes::PARSE_ERROR);
        assert!(!rejected.id.is_empty());
    }

    #[test]
    fn test_decode_non_object() {
        let rejected = decode(json!(["tasks/send"])).unwrap_err();
        assert_eq!(rejected.error.code, error_codes::INVALID_REQUEST);
        assert!(!rejected.id.is_empty());
    }

    #[test]
    fn test_decode_missing_method_keeps_id() {
        let rejected = decode(json!({"jsonrpc": "2.0", "id": "abc"})).unwrap_err();
        assert_eq!(rejected.error.code, error_codes::INVALID_REQUEST);
        assert_eq!(rejected.id, "abc");
    }

    #[test]
    fn test_decode_numeric_id() {
        let rejected = decode(json!({"jsonrpc": "2.0", "id": 42, "method": "nope"})).unwrap_err();
        assert_eq!(rejected.error.code, error_codes::METHOD_NOT_FOUND);
        assert_eq!(rejected.id, "42");
    }

    #[test]
    fn test_decode_null_id_replaced() {
        let rejected = decode(json!({"id": null, "method": "nope"})).unwrap_err();
        assert_eq!(rejected.error.code, error_codes::METHOD_NOT_FOUND);
        assert!(!rejected.id.is_empty());
    }

    #[test]
    fn test_decode_wrong_version() {
        let rejected = decode(json!({"jsonrpc": "1.0", "id": "x", "method": "tasks/send"}))
            .unwrap_err();
        assert_eq!(rejected.error.code, error_codes::INVALID_REQUEST);
    }

    #[test]
    fn test_decode_invalid_params() {
        let rejected = decode(json!({
            "jsonrpc": "2.0", "id": "x", "method": "tasks/send", "params": {"id": "t"}
        }))
        .unwrap_err();
        assert_eq!(rejected.error.code, error_codes::INVALID_PARAMS);
        assert_eq!(rejected.id, "x");
    }

    #[test]
    fn test_rejection_envelope() {
        let rejected = decode(json!({"id": "x", "method": "tasks/cancel"})).unwrap_err();
        let json = serde_json::to_value(rejected.into_response()).unwrap();

        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], "x");
        assert_eq!(json["error"]["code"], -32601);
        assert!(json.get("result").is_none());
    }

    #[test]
    fn test_empty_id_never_sent() {
        let response = JsonRpcResponse::<Value>::error("", JsonRpcError::parse_error());
        assert!(!response.id.is_empty());
    }

    #[test]
    fn test_encode_send_task() {
        let codec = JsonRpcCodec::new();
        let operation = A2AOperation::SendTask {
            params: TaskSendParams::new(Message::user("Hello")),
        };

        let bytes = codec.encode_request(&operation).unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["method"], "tasks/send");
        assert!(json["params"]["message"].is_object());
        assert!(json["id"].is_string());
    }

    #[test]
    fn test_encode_discover_has_no_body() {
        let bytes = JsonRpcCodec::new()
            .encode_request(&A2AOperation::DiscoverAgent)
            .unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_decode_success_response() {
        let codec = JsonRpcCodec::new();
        let json = r#"{
            "jsonrpc": "2.0",
            "id": "req-123",
            "result": {
                "id": "task-123",
                "sessionId": "s",
                "status": {"state": "submitted", "timestamp": "2024-01-01T00:00:00Z"},
                "history": [{"role": "user", "parts": [{"type": "text", "text": "Hello"}]}]
            }
        }"#;

        let operation = A2AOperation::GetTask {
            params: crate::protocol::task::TaskQueryParams::new("task-123"),
        };
        let response = codec.decode_response(json.as_bytes(), &operation).unwrap();

        let task = response.into_task().unwrap();
        assert_eq!(task.id, "task-123");
    }

    #[test]
    fn test_decode_error_response() {
        let codec = JsonRpcCodec::new();
        let json = r#"{"jsonrpc": "2.0", "id": "req-123",
            "error": {"code": -32600, "message": "Invalid Request"}}"#;

        let operation = A2AOperation::GetTask {
            params: crate::protocol::task::TaskQueryParams::new("task-123"),
        };
        match codec.decode_response(json.as_bytes(), &operation) {
            Err(A2AError::JsonRpc { code, message }) => {
                assert_eq!(code, -32600);
                assert_eq!(message, "Invalid Request");
            }
            other => panic!("Expected JsonRpc error, got {:?}", other),
        }
        assert!(codec.decode_error(json.as_bytes()).is_some());
    }

    #[test]
    fn test_decode_missing_result() {
        let response: JsonRpcResponse<Task> =
            serde_json::from_str(r#"{"jsonrpc": "2.0", "id": "req-123"}"#).unwrap();

        match response.into_result() {
            Err(A2AError::Protocol(msg)) => assert!(msg.contains("missing 'result' field")),
            other => panic!("Expected Protocol error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_mapping() {
        let err = A2AError::Registry(RegistryError::TaskNotFound {
            task_id: "t-1".into(),
        });
        let rpc = JsonRpcError::from(&err);
        assert_eq!(rpc.code, error_codes::TASK_NOT_FOUND);
        assert_eq!(rpc.data, Some(json!("t-1")));

        let rpc = JsonRpcError::from(&A2AError::Other("boom".into()));
        assert_eq!(rpc.code, error_codes::INTERNAL_ERROR);
        assert_eq!(rpc.message, "boom");
    }
}
