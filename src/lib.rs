//! # A2A Task Server
//!
//! An agent-to-agent (A2A) task protocol engine: agents expose a JSON-RPC
//! endpoint for submitting natural-language tasks and get back either the
//! submitted task or a Server-Sent Events stream of its lifecycle.
//!
//! ## Features
//!
//! - **Task lifecycle**: `submitted → working → completed | failed`, enforced by
//!   the [`server::TaskRegistry`]
//! - **Pluggable handlers**: unary and streaming handlers, plain closures work
//! - **Streaming**: one SSE frame per event, wrapped in a JSON-RPC response
//! - **Client**: a Tower-based client for `tasks/send`, `tasks/send/stream`,
//!   `tasks/get` and agent discovery
//!
//! ## Example
//!
//! ```rust,no_run
//! use a2a_task_server::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!
//!     let mut manager = TaskManager::from_config(&config);
//!     manager.register_handler(|message: Message| async move {
//!         Ok::<_, HandlerError>(HandlerResult::Text(message.text_content()))
//!     });
//!
//!     let card = AgentCard::new("Echo", config.base_url(), "0.1.0");
//!     A2AServer::new(config, manager, card).serve().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod protocol;
pub mod server;
pub mod service;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        client::{A2AClientBuilder, AgentClient},
        config::ServerConfig,
        protocol::error::A2AError,
        protocol::{
            A2AOperation, AgentCapabilities, AgentCard, AgentSkill, Artifact, Message, Part, Role,
            Task, TaskSendParams, TaskState, TaskStatus, TaskStreamEvent,
        },
        server::{
            A2AServer, HandlerError, HandlerResult, StreamingHandler, TaskManager, UnaryHandler,
        },
    };
}
