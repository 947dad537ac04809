//! Server and client configuration
//!
//! Values come from defaults, then an optional TOML file, then whatever the
//! binary layers on top from the environment and command line.

use std::{fs, path::Path, time::Duration};

use axum::http::{HeaderName, HeaderValue, Method};
use serde::Deserialize;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::{
    protocol::{
        error::{A2AError, A2AResult},
        operation::AGENT_CARD_PATH,
    },
    server::registry::EvictionPolicy,
};

const WILDCARD: &str = "*";

/// Top-level configuration of an A2A task server
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    /// Path of the JSON-RPC endpoint
    pub endpoint: String,

    /// Bound on each handler call in seconds; `0` or absent disables it
    pub handler_timeout_secs: Option<u64>,

    /// URL advertised on the agent card; derived from host and port if unset
    pub public_url: Option<String>,

    pub cors: CorsConfig,

    pub eviction: EvictionPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            endpoint: "/".to_string(),
            handler_timeout_secs: Some(300),
            public_url: None,
            cors: CorsConfig::default(),
            eviction: EvictionPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Read a TOML file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> A2AResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            A2AError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> A2AResult<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| A2AError::Config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> A2AResult<()> {
        if !self.endpoint.starts_with('/') {
            return Err(A2AError::Config(format!(
                "endpoint must start with '/': {}",
                self.endpoint
            )));
        }
        if self.endpoint == AGENT_CARD_PATH {
            return Err(A2AError::Config(format!(
                "endpoint collides with {}",
                AGENT_CARD_PATH
            )));
        }
        self.cors.to_layer().map(|_| ())
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        match self.handler_timeout_secs {
            Some(0) | None => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        }
    }

    /// `host:port` to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Externally reachable URL of the JSON-RPC endpoint
    pub fn base_url(&self) -> String {
        if let Some(url) = &self.public_url {
            return url.clone();
        }
        let host = match self.host.as_str() {
            "0.0.0.0" | "::" => "localhost",
            host => host,
        };
        format!("http://{}:{}{}", host, self.port, self.endpoint)
    }
}

/// Cross-origin settings for browser clients
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: vec![WILDCARD.to_string()],
            allow_methods: ["GET", "POST", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allow_headers: vec![WILDCARD.to_string()],
            allow_credentials: false,
        }
    }
}

impl CorsConfig {
    /// Build the CORS layer
    ///
    /// # Errors
    ///
    /// Returns `A2AError::Config` for unparsable entries, or when credentials
    /// are allowed together with a wildcard.
    pub fn to_layer(&self) -> A2AResult<CorsLayer> {
        let any_origin = is_wildcard(&self.allow_origins);
        let any_method = is_wildcard(&self.allow_methods);
        let any_header = is_wildcard(&self.allow_headers);

        if self.allow_credentials && (any_origin || any_method || any_header) {
            return Err(A2AError::Config(
                "CORS credentials cannot be combined with '*'".into(),
            ));
        }

        let origins = if any_origin {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(parse_all(&self.allow_origins, |s| {
                HeaderValue::from_str(s).ok()
            })?)
        };

        let methods = if any_method {
            AllowMethods::any()
        } else {
            AllowMethods::list(parse_all(&self.allow_methods, |s| {
                Method::from_bytes(s.to_ascii_uppercase().as_bytes()).ok()
            })?)
        };

        let headers = if any_header {
            AllowHeaders::any()
        } else {
            AllowHeaders::list(parse_all(&self.allow_headers, |s| {
                HeaderName::from_bytes(s.as_bytes()).ok()
            })?)
        };

        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(self.allow_credentials))
    }
}

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|value| value == WILDCARD)
}

fn parse_all<T>(values: &[String], parse: impl Fn(&str) -> Option<T>) -> A2AResult<Vec<T>> {
    values
        .iter()
        .map(|value| {
            parse(value).ok_or_else(|| A2AError::Config(format!("Invalid CORS entry: {}", value)))
        })
        .collect()
}

/// Default bound on a non-streaming client request
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings of an [`AgentClient`](crate::client::AgentClient)
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// URL of the agent's JSON-RPC endpoint
    pub agent_url: String,

    /// Streaming requests are not bounded by it
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(agent_url: impl Into<String>) -> Self {
        Self {
            agent_url: agent_url.into(),
            timeout: DEFAULT_CLIENT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
