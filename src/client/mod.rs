//! High-level client API for A2A task servers

pub mod agent;
pub mod builder;

pub use agent::AgentClient;
pub use builder::A2AClientBuilder;
