//! A2A service response types

use std::fmt;

use crate::{
    codec::sse::TaskResponseStream,
    protocol::{agent::AgentCard, task::Task},
};

/// Response from an A2A service operation
pub enum A2AResponse {
    /// From `tasks/send` and `tasks/get`
    Task(Box<Task>),

    /// From agent discovery
    AgentCard(Box<AgentCard>),

    /// Events of a `tasks/send/stream` request
    Stream(TaskResponseStream),

    /// Empty response (for operations with no return value)
    Empty,
}

impl A2AResponse {
    /// Extract a task from the response, if present
    pub fn into_task(self) -> Option<Task> {
        match self {
            A2AResponse::Task(task) => Some(*task),
            _ => None,
        }
    }

    /// Extract an agent card from the response, if present
    pub fn into_agent_card(self) -> Option<AgentCard> {
        match self {
            A2AResponse::AgentCard(card) => Some(*card),
            _ => None,
        }
    }

    /// Extract the event stream from the response, if present
    pub fn into_stream(self) -> Option<TaskResponseStream> {
        match self {
            A2AResponse::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    /// Check if the response is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, A2AResponse::Empty)
    }
}

impl fmt::Debug for A2AResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            A2AResponse::Task(task) => f.debug_tuple("Task").field(task).finish(),
            A2AResponse::AgentCard(card) => f.debug_tuple("AgentCard").field(card).finish(),
            A2AResponse::Stream(_) => f.write_str("Stream(..)"),
            A2AResponse::Empty => f.write_str("Empty"),
        }
    }
}
