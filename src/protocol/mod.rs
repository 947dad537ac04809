//! Core A2A protocol types and definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod agent;
pub mod error;
pub mod message;
pub mod operation;
pub mod task;

pub use agent::{AgentCapabilities, AgentCard, AgentSkill};
pub use error::{A2AError, A2AResult};
pub use message::{Message, Part, Role};
pub use operation::A2AOperation;
pub use task::{
    Task, TaskArtifactUpdateEvent, TaskQueryParams, TaskSendParams, TaskState, TaskStatus,
    TaskStatusUpdateEvent, TaskStreamEvent,
};

/// Artifact name for the primary textual answer
pub const RESPONSE_ARTIFACT: &str = "response";

/// Artifact name for structured results
pub const RESULT_ARTIFACT: &str = "result";

/// Artifacts represent task outputs
///
/// One artifact is one discrete unit of agent output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    /// A human readable name for the Artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// A human readable description of the Artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Contents of the Artifact
    pub parts: Vec<Part>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Artifact {
    /// A named artifact with a single text part
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_parts(name, vec![Part::text(text)])
    }

    /// A named artifact with a single data part
    pub fn data(name: impl Into<String>, data: Map<String, Value>) -> Self {
        Self::with_parts(name, vec![Part::data(data)])
    }

    fn with_parts(name: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
            parts,
            metadata: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
