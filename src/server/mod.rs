//! Task protocol engine: registry, dispatch and the HTTP surface

pub mod handler;
pub mod http;
pub mod manager;
pub mod registry;

pub use handler::{
    HandlerError, HandlerId, HandlerResult, HandlerStream, StreamingHandler, UnaryHandler,
};
pub use http::{build_router, A2AServer, AppState};
pub use manager::{TaskEventStream, TaskManager, DEFAULT_HANDLER_TIMEOUT};
pub use registry::{EvictionPolicy, RegistryError, TaskRegistry};
