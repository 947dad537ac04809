//! Client builder

use std::{sync::Arc, time::Duration};

use url::Url;

use crate::{
    client::AgentClient,
    codec::{Codec, JsonRpcCodec},
    config::{ClientConfig, DEFAULT_CLIENT_TIMEOUT},
    protocol::error::A2AError,
    service::A2AProtocolService,
    transport::{HttpTransport, Transport},
};

/// Builder for constructing A2A clients
///
/// # Example
///
/// ```rust,no_run
/// use a2a_task_server::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let url = "http://localhost:8000/".parse()?;
/// let mut client = A2AClientBuilder::new_http(url)
///     .with_timeout(Duration::from_secs(60))
///     .build()?;
///
/// let agent_card = client.discover().await?;
/// println!("Connected to: {}", agent_card.name);
/// # Ok(())
/// # }
/// ```
///
/// # Compiler Error
/// This will fail to compile if it is not clear to the compiler which type
/// implementing `Transport` is being used as underlying transport. This is
/// expected behaviour.
///
/// ```compile_fail
/// let client = A2AClientBuilder::new(agent_url()).build();
/// ```
pub struct A2AClientBuilder<T: Transport> {
    agent_url: Url,
    transport: Option<T>,
    codec: Option<Arc<dyn Codec>>,
    timeout: Option<Duration>,
}

impl<T: Transport> A2AClientBuilder<T> {
    /// Start a builder for the agent at `agent_url`
    pub fn new(agent_url: Url) -> Self {
        Self {
            agent_url,
            transport: None,
            codec: None,
            timeout: Some(DEFAULT_CLIENT_TIMEOUT),
        }
    }

    /// Use a custom transport
    pub fn with_transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom codec
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Set the timeout of non-streaming requests
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the A2A client
    ///
    /// # Errors
    ///
    /// Returns `A2AError::Config` if no transport has been configured
    pub fn build(self) -> Result<AgentClient<A2AProtocolService<T>>, A2AError> {
        let transport = self.transport.ok_or_else(|| {
            A2AError::Config("Transport not configured. Use new_http() or with_transport()".into())
        })?;

        let codec = self.codec.unwrap_or_else(|| Arc::new(JsonRpcCodec::new()));
        let service = A2AProtocolService::new(transport, codec);

        let config = ClientConfig::new(self.agent_url)
            .with_timeout(self.timeout.unwrap_or(DEFAULT_CLIENT_TIMEOUT));

        Ok(AgentClient::new(service, config))
    }
}

impl A2AClientBuilder<HttpTransport> {
    /// Create a new client builder using the HTTP transport
    ///
    /// # Arguments
    ///
    /// * `agent_url` - URL of the agent's JSON-RPC endpoint (e.g., "<http://localhost:8000/>")
    pub fn new_http(agent_url: Url) -> Self {
        let transport = HttpTransport::new(agent_url.clone());
        Self::new(agent_url)
            .with_transport(transport)
            .with_codec(Arc::new(JsonRpcCodec::new()))
    }
}
