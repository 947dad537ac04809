//! Agent discovery and capability types

use serde::{Deserialize, Serialize};

/// Agent Card for agent discovery
///
/// The Agent Card is published at `/.well-known/agent.json` and describes the
/// agent's identity, version, capabilities and skills. It is static for the
/// lifetime of a server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentCard {
    /// Name of the agent
    pub name: String,

    /// Human-readable description of the agent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// URL of the agent's JSON-RPC endpoint
    pub url: String,

    /// Agent version
    pub version: String,

    /// Agent capabilities
    #[serde(default)]
    pub capabilities: AgentCapabilities,

    /// Skills the agent offers
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    /// Create a new agent card
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            url: url.into(),
            version: version.into(),
            capabilities: AgentCapabilities::default(),
            skills: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the capabilities
    pub fn with_capabilities(mut self, capabilities: AgentCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Add a skill
    pub fn with_skill(mut self, skill: AgentSkill) -> Self {
        self.skills.push(skill);
        self
    }
}

/// Agent capabilities
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentCapabilities {
    /// Supports `tasks/send/stream`
    #[serde(default)]
    pub streaming: bool,

    /// Supports push notifications
    #[serde(rename = "pushNotifications", default)]
    pub push_notifications: bool,
}

impl AgentCapabilities {
    /// Create capabilities with default values (all false)
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable streaming
    pub fn with_streaming(mut self) -> Self {
        self.streaming = true;
        self
    }
}

/// A skill advertised on the agent card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSkill {
    pub id: String,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Example prompts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
}

impl AgentSkill {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            examples: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an example prompt
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.examples
            .get_or_insert_with(Vec::new)
            .push(example.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_card_creation() {
        let card = AgentCard::new("Test Agent", "http://localhost:8000", "0.2.0")
            .with_description("A test agent")
            .with_capabilities(AgentCapabilities::new().with_streaming())
            .with_skill(
                AgentSkill::new("arithmetic", "Arithmetic")
                    .with_description("Add, subtract, multiply, divide")
                    .with_example("What is 5 + 3?")
                    .with_example("Divide 100 by 2"),
            );

        assert_eq!(card.name, "Test Agent");
        assert!(card.capabilities.streaming);
        assert_eq!(card.skills.len(), 1);
        assert_eq!(card.skills[0].examples.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_agent_card_serialization() {
        let card = AgentCard::new("Test", "http://localhost:8000", "1.0.0")
            .with_skill(AgentSkill::new("echo", "Echo"));

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["name"], "Test");
        assert_eq!(json["url"], "http://localhost:8000");
        assert_eq!(json["skills"][0]["id"], "echo");
        assert!(json.get("description").is_none());
        assert!(json["skills"][0].get("examples").is_none());

        let deserialized: AgentCard = serde_json::from_value(json).unwrap();
        assert_eq!(card, deserialized);
    }

    #[test]
    fn test_minimal_card_decodes() {
        let card: AgentCard = serde_json::from_str(
            r#"{"name":"n","url":"http://a","version":"1","skills":[]}"#,
        )
        .unwrap();
        assert!(!card.capabilities.streaming);
    }
}
