//! Standalone A2A task server with demonstration handlers
use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use futures::{stream, StreamExt};
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use a2a_task_server::{
    config::ServerConfig,
    protocol::{AgentCapabilities, AgentCard, AgentSkill, Message},
    server::{A2AServer, HandlerError, HandlerResult, TaskManager},
};

#[derive(Parser, Debug)]
#[command(author, version, about = "A2A task protocol server")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "A2A_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "A2A_SERVER_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "A2A_SERVER_PORT")]
    port: Option<u16>,

    /// Seconds a handler may run before its task fails; 0 disables the limit
    #[arg(long)]
    handler_timeout: Option<u64>,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ServerConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(secs) = self.handler_timeout {
            config.handler_timeout_secs = Some(secs);
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let config = Args::parse().into_config()?;

    let mut manager = TaskManager::from_config(&config);
    manager.register_handler(echo);
    manager.register_streaming_handler(|message: Message| {
        let words: Vec<String> = message
            .text_content()
            .split_whitespace()
            .map(String::from)
            .collect();
        stream::iter(words).then(|word| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, HandlerError>(HandlerResult::Text(word))
        })
    });

    let card = AgentCard::new("Echo Agent", config.base_url(), env!("CARGO_PKG_VERSION"))
        .with_description("Echoes text and data back, word by word when streaming")
        .with_capabilities(AgentCapabilities::new().with_streaming())
        .with_skill(
            AgentSkill::new("echo", "Echo")
                .with_description("Returns the message it was sent")
                .with_example("hello there"),
        );

    let server = A2AServer::new(config, manager, card);
    server
        .serve_with_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "failed to listen for Ctrl-C");
                return;
            }
            info!("shutdown requested");
        })
        .await?;

    Ok(())
}

/// Text comes back as text; a message made only of data echoes its first
/// data part
async fn echo(message: Message) -> Result<HandlerResult, HandlerError> {
    let text = message.text_content();
    if !text.is_empty() {
        return Ok(HandlerResult::Text(text));
    }

    message
        .parts
        .iter()
        .find_map(|part| part.as_data())
        .map(|data| HandlerResult::Data(Value::Object(data.clone())))
        .ok_or_else(|| HandlerError::failed("message has no content"))
}
