//! HTTP surface of the task server, powered by axum
//!
//! Serves:
//! - `POST <endpoint>`: JSON-RPC 2.0 (`tasks/send`, `tasks/send/stream`, `tasks/get`)
//! - `GET  /.well-known/agent.json`: Agent Card discovery

use std::{future::Future, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{Stream, StreamExt};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::{
    codec::{
        jsonrpc::{JsonRpcCodec, JsonRpcError, JsonRpcResponse},
        sse::SseCodec,
    },
    config::ServerConfig,
    protocol::{
        agent::AgentCard,
        error::{A2AError, A2AResult},
        operation::{A2AOperation, AGENT_CARD_PATH},
    },
    server::manager::{TaskEventStream, TaskManager},
};

/// Shared state of the router
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TaskManager>,
    pub agent_card: Arc<AgentCard>,
}

/// Build the router for the JSON-RPC endpoint and the agent card
pub fn build_router(state: AppState, config: &ServerConfig) -> A2AResult<Router> {
    let cors = config.cors.to_layer()?;

    Ok(Router::new()
        .route(AGENT_CARD_PATH, get(get_agent_card))
        .route(&config.endpoint, post(handle_jsonrpc))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state))
}

async fn get_agent_card(State(state): State<AppState>) -> Json<AgentCard> {
    Json(state.agent_card.as_ref().clone())
}

async fn handle_jsonrpc(State(state): State<AppState>, body: Bytes) -> Response {
    let (id, operation) = match JsonRpcCodec::new().decode_request(&body) {
        Ok(decoded) => decoded,
        Err(rejected) => {
            warn!(
                request_id = %rejected.id,
                code = rejected.error.code,
                "rejected JSON-RPC request"
            );
            return error_response(rejected.into_response());
        }
    };

    debug!(
        request_id = %id,
        method = operation.rpc_method().unwrap_or_default(),
        "dispatching JSON-RPC request"
    );

    let manager = &state.manager;
    match operation {
        A2AOperation::SendTask { params } => match manager.on_send_task(params).await {
            Ok(task) => Json(JsonRpcResponse::success(id, task)).into_response(),
            Err(err) => failure(id, &err),
        },
        A2AOperation::SendTaskStreaming { params } => {
            match manager.on_send_task_streaming(params).await {
                Ok(events) => event_stream(id, events).into_response(),
                Err(err) => failure(id, &err),
            }
        }
        A2AOperation::GetTask { params } => match manager.on_get_task(params).await {
            Ok(task) => Json(JsonRpcResponse::success(id, task)).into_response(),
            Err(err) => failure(id, &err),
        },
        A2AOperation::DiscoverAgent => error_response(JsonRpcResponse::error(
            id,
            JsonRpcError::method_not_found("agent/discover"),
        )),
    }
}

fn failure(id: String, err: &A2AError) -> Response {
    warn!(request_id = %id, error = %err, "JSON-RPC request failed");
    error_response(JsonRpcResponse::error(id, JsonRpcError::from(err)))
}

fn error_response(body: JsonRpcResponse) -> Response {
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// One SSE frame per event, each wrapped in its own JSON-RPC response
fn event_stream(
    id: String,
    events: TaskEventStream,
) -> Sse<impl Stream<Item = Result<Event, A2AError>>> {
    let codec = SseCodec::new();
    Sse::new(events.map(move |event| {
        let frame = JsonRpcResponse::success(id.clone(), event);
        codec.encode(&frame).map(|data| Event::default().data(data))
    }))
}

/// A configured task server
pub struct A2AServer {
    config: ServerConfig,
    manager: Arc<TaskManager>,
    agent_card: Arc<AgentCard>,
}

impl A2AServer {
    pub fn new(config: ServerConfig, manager: TaskManager, agent_card: AgentCard) -> Self {
        Self {
            config,
            manager: Arc::new(manager),
            agent_card: Arc::new(agent_card),
        }
    }

    pub fn manager(&self) -> &Arc<TaskManager> {
        &self.manager
    }

    pub fn router(&self) -> A2AResult<Router> {
        let state = AppState {
            manager: self.manager.clone(),
            agent_card: self.agent_card.clone(),
        };
        build_router(state, &self.config)
    }

    /// Serve until the process is killed
    pub async fn serve(self) -> A2AResult<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Bind the configured address and serve until `signal` resolves
    pub async fn serve_with_shutdown<F>(self, signal: F) -> A2AResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.config.validate()?;
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        self.serve_listener(listener, signal).await
    }

    /// Serve on an already bound listener until `signal` resolves
    ///
    /// In-flight processing routines are not awaited on shutdown.
    pub async fn serve_listener<F>(self, listener: TcpListener, signal: F) -> A2AResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router()?;
        let addr = listener.local_addr()?;
        let sweeper = self.manager.registry().spawn_sweeper();

        info!("A2A task server starting on http://{}", addr);
        info!("   Agent Card: http://{}{}", addr, AGENT_CARD_PATH);
        info!("   JSON-RPC:   http://{}{}", addr, self.config.endpoint);

        axum::serve(listener, router)
            .with_graceful_shutdown(signal)
            .await?;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        info!("A2A task server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    fn test_router() -> Router {
        let state = AppState {
            manager: Arc::new(TaskManager::default()),
            agent_card: Arc::new(AgentCard::new("Test", "http://localhost:8000/", "0.1.0")),
        };
        build_router(state, &ServerConfig::default()).unwrap()
    }

    async fn post_json(router: Router, body: String) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("request");

        let resp = router.oneshot(req).await.expect("response");
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn test_agent_card_endpoint() {
        let req = Request::builder()
            .uri("/.well-known/agent.json")
            .body(Body::empty())
            .expect("request");

        let resp = test_router().oneshot(req).await.expect("response");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let (status, body) = post_json(test_router(), "{oops".to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32700);
        assert!(!body["id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_task() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tasks/send",
            "params": {
                "id": "task-1",
                "message": {"role": "user", "parts": [{"type": "text", "text": "hi"}]}
            }
        });

        let (status, body) = post_json(test_router(), body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "1");
        assert_eq!(body["result"]["id"], "task-1");
        assert_eq!(body["result"]["status"]["state"], "submitted");
    }

    #[tokio::test]
    async fn test_unknown_task() {
        let body = json!({
            "jsonrpc": "2.0", "id": "g", "method": "tasks/get", "params": {"id": "nope"}
        });

        let (status, body) = post_json(test_router(), body.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32001);
    }
}
