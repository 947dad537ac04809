//! A2A task types and lifecycle management

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{message::Message, Artifact};

/// A task in the A2A protocol
///
/// Tasks represent one request/response lifecycle. They are created in the
/// `submitted` state and accumulate artifacts as handlers produce output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique identifier for the task
    pub id: String,

    /// Groups related tasks
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Current status of the task
    pub status: TaskStatus,

    /// Outputs produced so far, in production order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,

    /// Messages exchanged for this task, starting with the triggering message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Task {
    /// Create a new submitted task triggered by `message`
    pub fn new(id: impl Into<String>, session_id: impl Into<String>, message: Message) -> Self {
        Self {
            id: id.into(),
            session_id: Some(session_id.into()),
            status: TaskStatus::new(TaskState::Submitted),
            artifacts: Vec::new(),
            history: vec![message],
            metadata: None,
        }
    }

    /// Check if the task is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.state.is_terminal()
    }

    /// Check if the task is still processing
    pub fn is_processing(&self) -> bool {
        matches!(self.status.state, TaskState::Submitted | TaskState::Working)
    }

    /// Update the task status
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Append an artifact
    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// Append a message to the history
    pub fn with_history_message(mut self, message: Message) -> Self {
        self.history.push(message);
        self
    }

    /// Keep only the `limit` most recent history messages
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        let excess = self.history.len().saturating_sub(limit);
        self.history.drain(..excess);
        self
    }
}

/// Status of a task: its state, an optional agent message and when it was set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatus {
    /// Current lifecycle state
    pub state: TaskState,

    /// Optional message explaining the state (e.g. a failure detail)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,

    /// When the state was entered (RFC 3339 on the wire)
    pub timestamp: DateTime<Utc>,
}

impl TaskStatus {
    /// Create a status stamped with the current time
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            message: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach an explanatory message
    pub fn with_message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }
}

/// Task state in the A2A protocol lifecycle
///
/// Task lifecycle: submitted → working → completed/failed/canceled.
/// `input-required` and `unknown` are reachable but only set by collaborators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Task has been received and is queued for processing
    Submitted,

    /// Task is currently being processed
    Working,

    /// Task requires additional input from the client
    InputRequired,

    /// Task completed successfully
    Completed,

    /// Task was canceled
    Canceled,

    /// Task failed with an error
    Failed,

    /// State could not be determined
    Unknown,
}

impl TaskState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Canceled
        )
    }

    /// Whether the lifecycle permits moving from `self` to `next`
    ///
    /// Terminal states are final and nothing returns to `submitted`. A
    /// submitted task must start `working` before it completes or fails; only
    /// cancellation may skip that step. A state never transitions to itself.
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        if self.is_terminal() || next == TaskState::Submitted {
            return false;
        }
        if *self == TaskState::Submitted {
            return matches!(next, TaskState::Working | TaskState::Canceled);
        }
        *self != next
    }

    /// The wire name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Submitted => "submitted",
            TaskState::Working => "working",
            TaskState::InputRequired => "input-required",
            TaskState::Completed => "completed",
            TaskState::Canceled => "canceled",
            TaskState::Failed => "failed",
            TaskState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status change notification emitted on the streaming path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatusUpdateEvent {
    /// Task the event belongs to
    pub id: String,

    /// The new status
    pub status: TaskStatus,

    /// True only for the terminal event of a stream
    #[serde(rename = "final", default)]
    pub is_final: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Artifact notification emitted on the streaming path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskArtifactUpdateEvent {
    /// Task the event belongs to
    pub id: String,

    /// The produced artifact
    pub artifact: Artifact,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// One event of a task stream
///
/// The variants are distinguished structurally on the wire: status events
/// carry `status`, artifact events carry `artifact`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TaskStreamEvent {
    Status(TaskStatusUpdateEvent),
    Artifact(TaskArtifactUpdateEvent),
}

impl TaskStreamEvent {
    /// Status event; marked final when the state is terminal
    pub fn status(id: impl Into<String>, status: TaskStatus) -> Self {
        let is_final = status.state.is_terminal();
        Self::Status(TaskStatusUpdateEvent {
            id: id.into(),
            status,
            is_final,
            metadata: None,
        })
    }

    /// Artifact event
    pub fn artifact(id: impl Into<String>, artifact: Artifact) -> Self {
        Self::Artifact(TaskArtifactUpdateEvent {
            id: id.into(),
            artifact,
            metadata: None,
        })
    }

    /// Task id the event belongs to
    pub fn task_id(&self) -> &str {
        match self {
            TaskStreamEvent::Status(event) => &event.id,
            TaskStreamEvent::Artifact(event) => &event.id,
        }
    }

    /// Whether this event ends the stream
    pub fn is_final(&self) -> bool {
        matches!(self, TaskStreamEvent::Status(event) if event.is_final)
    }

    /// The state carried by a status event
    pub fn state(&self) -> Option<TaskState> {
        match self {
            TaskStreamEvent::Status(event) => Some(event.status.state),
            TaskStreamEvent::Artifact(_) => None,
        }
    }
}

fn new_hex_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Parameters of `tasks/send` and `tasks/send/stream`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSendParams {
    /// Task id; generated when absent
    #[serde(default = "new_hex_id")]
    pub id: String,

    /// Session id; generated when absent
    #[serde(rename = "sessionId", default = "new_hex_id")]
    pub session_id: String,

    /// The triggering message
    pub message: Message,

    #[serde(rename = "historyLength", skip_serializing_if = "Option::is_none")]
    pub history_length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl TaskSendParams {
    /// Params for a new task with fresh task and session ids
    pub fn new(message: Message) -> Self {
        Self {
            id: new_hex_id(),
            session_id: new_hex_id(),
            message,
            history_length: None,
            metadata: None,
        }
    }

    /// Use a specific session id
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }
}

/// Parameters of `tasks/get`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskQueryParams {
    /// The task to look up
    pub id: String,

    /// Return at most this many of the most recent history messages
    #[serde(rename = "historyLength", skip_serializing_if = "Option::is_none")]
    pub history_length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl TaskQueryParams {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history_length: None,
            metadata: None,
        }
    }
}
