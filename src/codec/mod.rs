//! Serialization codecs for the JSON-RPC and SSE bindings

pub mod jsonrpc;
pub mod sse;

pub use jsonrpc::{JsonRpcCodec, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RejectedRequest};
pub use sse::{SseCodec, TaskResponseStream};

use bytes::Bytes;

use crate::{
    protocol::{error::A2AError, operation::A2AOperation},
    service::response::A2AResponse,
};

/// Client-side codec for encoding operations and decoding their responses
pub trait Codec: Send + Sync {
    /// Serialize an operation into a request body
    ///
    /// Operations without a body (agent discovery) encode to empty bytes.
    fn encode_request(&self, operation: &A2AOperation) -> Result<Bytes, A2AError>;

    /// Deserialize a response body for `operation`
    fn decode_response(
        &self,
        body: &[u8],
        operation: &A2AOperation,
    ) -> Result<A2AResponse, A2AError>;

    /// MIME type of request bodies
    fn content_type(&self) -> &str;
}
