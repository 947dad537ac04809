//! A2A protocol operations

use super::task::{TaskQueryParams, TaskSendParams};

/// JSON-RPC method names understood by the task endpoint
pub mod methods {
    pub const SEND_TASK: &str = "tasks/send";
    pub const SEND_TASK_STREAMING: &str = "tasks/send/stream";
    pub const GET_TASK: &str = "tasks/get";
}

/// Path of the agent card
pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";

/// A2A protocol operations
///
/// The server decodes incoming JSON-RPC requests into these, and the client
/// encodes them into requests.
#[derive(Debug, Clone, PartialEq)]
pub enum A2AOperation {
    /// Submit a task and receive the initial task
    SendTask { params: TaskSendParams },

    /// Submit a task and receive its events over SSE
    SendTaskStreaming { params: TaskSendParams },

    /// Look up a task by id
    GetTask { params: TaskQueryParams },

    /// Fetch the agent card
    DiscoverAgent,
}

impl A2AOperation {
    /// The JSON-RPC method name, if this operation travels as JSON-RPC
    pub fn rpc_method(&self) -> Option<&'static str> {
        match self {
            A2AOperation::SendTask { .. } => Some(methods::SEND_TASK),
            A2AOperation::SendTaskStreaming { .. } => Some(methods::SEND_TASK_STREAMING),
            A2AOperation::GetTask { .. } => Some(methods::GET_TASK),
            A2AOperation::DiscoverAgent => None,
        }
    }

    /// Endpoint path relative to the agent URL
    ///
    /// JSON-RPC operations are posted to the agent URL itself.
    pub fn endpoint(&self) -> &'static str {
        match self {
            A2AOperation::DiscoverAgent => AGENT_CARD_PATH,
            _ => "",
        }
    }

    /// Get the HTTP method for this operation
    pub fn method(&self) -> &'static str {
        match self {
            A2AOperation::DiscoverAgent => "GET",
            _ => "POST",
        }
    }

    /// Check if this operation expects a streaming response
    pub fn is_streaming(&self) -> bool {
        matches!(self, A2AOperation::SendTaskStreaming { .. })
    }

    /// Task id addressed by the operation
    pub fn task_id(&self) -> Option<&str> {
        match self {
            A2AOperation::SendTask { params } | A2AOperation::SendTaskStreaming { params } => {
                Some(&params.id)
            }
            A2AOperation::GetTask { params } => Some(&params.id),
            A2AOperation::DiscoverAgent => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::message::Message;

    use super::*;

    #[test]
    fn test_operation_routing() {
        let op = A2AOperation::SendTask {
            params: TaskSendParams::new(Message::user("test")),
        };
        assert_eq!(op.rpc_method(), Some("tasks/send"));
        assert_eq!(op.endpoint(), "");
        assert_eq!(op.method(), "POST");

        let op = A2AOperation::GetTask {
            params: TaskQueryParams::new("task-123"),
        };
        assert_eq!(op.rpc_method(), Some("tasks/get"));
        assert_eq!(op.task_id(), Some("task-123"));

        let op = A2AOperation::DiscoverAgent;
        assert_eq!(op.rpc_method(), None);
        assert_eq!(op.endpoint(), "/.well-known/agent.json");
        assert_eq!(op.method(), "GET");
    }

    #[test]
    fn test_operation_streaming() {
        let params = TaskSendParams::new(Message::user("test"));

        let op = A2AOperation::SendTaskStreaming {
            params: params.clone(),
        };
        assert!(op.is_streaming());
        assert_eq!(op.rpc_method(), Some("tasks/send/stream"));

        let op = A2AOperation::SendTask { params };
        assert!(!op.is_streaming());
    }
}
