//! A2A service request types

use std::{collections::HashMap, time::Duration};

use crate::{config::DEFAULT_CLIENT_TIMEOUT, protocol::operation::A2AOperation};

/// An operation plus the context needed to execute it
#[derive(Debug, Clone)]
pub struct A2ARequest {
    pub operation: A2AOperation,

    pub context: RequestContext,
}

impl A2ARequest {
    /// Create a new A2A request
    pub fn new(operation: A2AOperation, context: RequestContext) -> Self {
        Self { operation, context }
    }
}

/// Per-request settings
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Agent URL the request targets
    pub agent_url: String,

    /// Request timeout; ignored for streaming requests
    pub timeout: Option<Duration>,

    /// Extra headers
    pub metadata: HashMap<String, String>,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(agent_url: impl Into<String>) -> Self {
        Self {
            agent_url: agent_url.into(),
            timeout: Some(DEFAULT_CLIENT_TIMEOUT),
            metadata: HashMap::new(),
        }
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add a metadata header
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new("")
    }
}
