//! A2A message types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::A2AError;

/// A message in the A2A protocol
///
/// Messages carry the natural-language request that creates a task, and the
/// optional explanation an agent attaches to a status update. A message with
/// no parts is accepted on the wire but carries no content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,

    /// Message content parts, in order
    pub parts: Vec<Part>,

    /// Optional metadata for the message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Message {
    /// Create a new message with a single text part
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::text(text)],
            metadata: None,
        }
    }

    /// Create a user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an agent message with text content
    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Role::Agent, text)
    }

    /// Create a user message carrying a single structured data part
    pub fn user_data(data: Map<String, Value>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::data(data)],
            metadata: None,
        }
    }

    /// Create a new message builder
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    /// Add a metadata field to the message
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// Add a message part
    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// True when the message carries no parts
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Concatenation of every text part, in order
    ///
    /// Data parts are ignored. An empty message yields an empty string.
    pub fn text_content(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }
}

/// Builder for constructing Message instances
#[derive(Debug, Default)]
pub struct MessageBuilder {
    role: Option<Role>,
    parts: Vec<Part>,
    metadata: Option<Map<String, Value>>,
}

impl MessageBuilder {
    /// Create a new message builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the role of the message
    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Set the message parts
    pub fn parts(mut self, parts: Vec<Part>) -> Self {
        self.parts = parts;
        self
    }

    /// Add a single part to the message
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Add a metadata field
    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// Build the message
    ///
    /// # Errors
    ///
    /// Returns `A2AError::Validation` if no role was set
    pub fn build(self) -> Result<Message, A2AError> {
        let role = self
            .role
            .ok_or_else(|| A2AError::Validation("Message role is required".into()))?;

        Ok(Message {
            role,
            parts: self.parts,
            metadata: self.metadata,
        })
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from a user
    User,

    /// Message from an AI agent
    Agent,
}

/// A part of a message or artifact
///
/// Parts are discriminated on the wire by their `type` field:
/// `{"type": "text", "text": ...}` or `{"type": "data", "data": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    /// Plain text content
    Text {
        /// The text content
        text: String,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Map<String, Value>>,
    },

    /// Structured data keyed by string
    Data {
        /// The structured data
        data: Map<String, Value>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Map<String, Value>>,
    },
}

impl Part {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            metadata: None,
        }
    }

    /// Create a data part
    pub fn data(data: Map<String, Value>) -> Self {
        Self::Data {
            data,
            metadata: None,
        }
    }

    /// The text of a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text, .. } => Some(text),
            Part::Data { .. } => None,
        }
    }

    /// The payload of a data part
    pub fn as_data(&self) -> Option<&Map<String, Value>> {
        match self {
            Part::Data { data, .. } => Some(data),
            Part::Text { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.parts.len(), 1);
        assert_eq!(msg.parts[0].as_text(), Some("Hello, agent!"));
    }

    #[test]
    fn test_message_with_metadata() {
        let msg = Message::user("Test").with_metadata("key", json!("value"));

        let metadata = msg.metadata.unwrap();
        assert_eq!(metadata.get("key"), Some(&json!("value")));
    }

    #[test]
    fn test_text_part_wire_format() {
        let json = serde_json::to_value(Part::text("2+2")).unwrap();
        assert_eq!(json, json!({"type": "text", "text": "2+2"}));
    }

    #[test]
    fn test_data_part_wire_format() {
        let data = json!({"result": 4}).as_object().cloned().unwrap();
        let json = serde_json::to_value(Part::data(data)).unwrap();
        assert_eq!(json, json!({"type": "data", "data": {"result": 4}}));
    }

    #[test]
    fn test_message_deserialization() {
        let msg: Message = serde_json::from_value(json!({
            "role": "user",
            "parts": [
                {"type": "text", "text": "What is "},
                {"type": "data", "data": {"x": 1}},
                {"type": "text", "text": "2+2?"}
            ]
        }))
        .unwrap();

        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.parts.len(), 3);
        assert_eq!(msg.text_content(), "What is 2+2?");
        assert!(msg.parts[1].as_data().is_some());
    }

    #[test]
    fn test_unknown_part_type_rejected() {
        let result: Result<Message, _> = serde_json::from_value(json!({
            "role": "user",
            "parts": [{"type": "file", "file": {"name": "a.txt"}}]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_message_has_no_content() {
        let msg: Message = serde_json::from_value(json!({"role": "agent", "parts": []})).unwrap();
        assert!(msg.is_empty());
        assert_eq!(msg.text_content(), "");
    }

    #[test]
    fn test_message_builder() {
        let msg = Message::builder()
            .role(Role::Agent)
            .part(Part::text("First"))
            .part(Part::text("Second"))
            .metadata("source", json!("test"))
            .build()
            .unwrap();

        assert_eq!(msg.role, Role::Agent);
        assert_eq!(msg.parts.len(), 2);
        assert!(msg.metadata.is_some());
    }

    #[test]
    fn test_message_builder_missing_role() {
        let result = Message::builder().parts(vec![Part::text("Hello")]).build();
        assert!(matches!(result, Err(A2AError::Validation(_))));
    }
}
