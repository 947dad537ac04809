//! High-level A2A agent client

use std::time::Duration;

use serde_json::{Map, Value};
use tower::ServiceExt;
use tower_service::Service;

use crate::{
    codec::sse::TaskResponseStream,
    config::ClientConfig,
    protocol::{
        error::A2AError,
        message::Message,
        operation::A2AOperation,
        task::{Task, TaskQueryParams, TaskSendParams},
        AgentCard,
    },
    service::{A2ARequest, A2AResponse, RequestContext},
};

/// High-level A2A client for interacting with agents
///
/// This client wraps a Tower service and provides convenient methods for the
/// task operations an agent serves.
///
/// # Example
///
/// ```rust,no_run
/// use a2a_task_server::prelude::*;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let url = "http://localhost:8000/".parse()?;
/// let mut client = A2AClientBuilder::new_http(url).build()?;
///
/// let task = client.send_task(Message::user("What is 2+2?")).await?;
/// let task = client
///     .poll_until_complete(&task.id, std::time::Duration::from_millis(200), 50)
///     .await?;
/// println!("Task {} is {}", task.id, task.status.state);
/// # Ok(())
/// # }
/// ```
pub struct AgentClient<S> {
    service: S,
    config: ClientConfig,
}

impl<S> AgentClient<S>
where
    S: Service<A2ARequest, Response = A2AResponse, Error = A2AError>,
{
    /// Create a new agent client
    pub fn new(service: S, config: ClientConfig) -> Self {
        Self { service, config }
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_context(&self) -> RequestContext {
        RequestContext::new(self.config.agent_url.clone()).with_timeout(self.config.timeout)
    }

    async fn execute(&mut self, operation: A2AOperation) -> Result<A2AResponse, A2AError> {
        let request = A2ARequest::new(operation, self.build_context());
        self.service.ready().await?.call(request).await
    }

    /// Submit a task for `message` with fresh task and session ids
    ///
    /// The returned task is in the `submitted` state; processing continues on
    /// the agent. Use [`get_task`](Self::get_task) to observe the outcome.
    pub async fn send_task(&mut self, message: Message) -> Result<Task, A2AError> {
        self.send_task_with_params(TaskSendParams::new(message))
            .await
    }

    /// Submit a task whose message is a single structured data part
    pub async fn send_data(&mut self, data: Map<String, Value>) -> Result<Task, A2AError> {
        self.send_task(Message::user_data(data)).await
    }

    /// Submit a task with explicit parameters
    pub async fn send_task_with_params(
        &mut self,
        params: TaskSendParams,
    ) -> Result<Task, A2AError> {
        match self.execute(A2AOperation::SendTask { params }).await? {
            A2AResponse::Task(task) => Ok(*task),
            _ => Err(A2AError::Protocol(
                "Expected task response from send_task".into(),
            )),
        }
    }

    /// Submit a task and stream its events
    ///
    /// The stream ends after the final status event.
    pub async fn send_task_streaming(
        &mut self,
        params: TaskSendParams,
    ) -> Result<TaskResponseStream, A2AError> {
        match self
            .execute(A2AOperation::SendTaskStreaming { params })
            .await?
        {
            A2AResponse::Stream(events) => Ok(events),
            _ => Err(A2AError::Protocol(
                "Expected event stream from send_task_streaming".into(),
            )),
        }
    }

    /// Get a task by ID
    ///
    /// # Errors
    ///
    /// Returns `A2AError::TaskNotFound` if the task doesn't exist
    pub async fn get_task(&mut self, task_id: impl Into<String>) -> Result<Task, A2AError> {
        self.get_task_with_params(TaskQueryParams::new(task_id))
            .await
    }

    /// Get a task, optionally limiting the returned history
    pub async fn get_task_with_params(
        &mut self,
        params: TaskQueryParams,
    ) -> Result<Task, A2AError> {
        match self.execute(A2AOperation::GetTask { params }).await? {
            A2AResponse::Task(task) => Ok(*task),
            _ => Err(A2AError::Protocol(
                "Expected task response from get_task".into(),
            )),
        }
    }

    /// Fetch the agent card from `/.well-known/agent.json`
    pub async fn discover(&mut self) -> Result<AgentCard, A2AError> {
        match self.execute(A2AOperation::DiscoverAgent).await? {
            A2AResponse::AgentCard(card) => Ok(*card),
            _ => Err(A2AError::Protocol(
                "Expected agent card response from discover".into(),
            )),
        }
    }

    /// Poll a task until it reaches a terminal state
    ///
    /// # Arguments
    ///
    /// * `task_id` - The task ID to poll
    /// * `poll_interval` - Delay between polls
    /// * `max_attempts` - Maximum number of polling attempts (0 = unlimited)
    ///
    /// # Errors
    ///
    /// Returns `A2AError::Timeout` once `max_attempts` polls saw a live task
    pub async fn poll_until_complete(
        &mut self,
        task_id: &str,
        poll_interval: Duration,
        max_attempts: usize,
    ) -> Result<Task, A2AError> {
        let mut attempts = 0;

        loop {
            let task = self.get_task(task_id).await?;

            if task.is_terminal() {
                return Ok(task);
            }

            attempts += 1;
            if max_attempts > 0 && attempts >= max_attempts {
                return Err(A2AError::Timeout);
            }

            tokio::time::sleep(poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use bytes::Bytes;

    use crate::{
        codec::{jsonrpc::JsonRpcResponse, JsonRpcCodec},
        protocol::{
            agent::AgentCard,
            task::{TaskState, TaskStatus},
        },
        service::A2AProtocolService,
        transport::{mock::MockTransport, TransportResponse},
    };

    use super::*;

    fn client(transport: MockTransport) -> AgentClient<A2AProtocolService<MockTransport>> {
        let service = A2AProtocolService::new(transport, Arc::new(JsonRpcCodec::new()));
        AgentClient::new(service, ClientConfig::new("http://mock.local/"))
    }

    fn task_body(task: Task) -> TransportResponse {
        let json = serde_json::to_vec(&JsonRpcResponse::success("1", task)).unwrap();
        TransportResponse::new(200).body(Bytes::from(json))
    }

    #[tokio::test]
    async fn test_send_task() {
        let transport = MockTransport::new(|req| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
            assert_eq!(body["method"], "tasks/send");
            let id = body["params"]["id"].as_str().unwrap();
            task_body(Task::new(id, "s", Message::user("Hello")))
        });

        let params = TaskSendParams::new(Message::user("Hello"));
        let task = client(transport)
            .send_task_with_params(params.clone())
            .await
            .unwrap();

        assert_eq!(task.id, params.id);
        assert_eq!(task.status.state, TaskState::Submitted);
    }

    #[tokio::test]
    async fn test_send_data() {
        let transport = MockTransport::new(|req| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
            let part = &body["params"]["message"]["parts"][0];
            assert_eq!(part["type"], "data");
            assert_eq!(part["data"]["expression"], "2+2");
            let id = body["params"]["id"].as_str().unwrap();
            task_body(Task::new(id, "s", Message::user("2+2")))
        });

        let data = serde_json::json!({"expression": "2+2"});
        let task = client(transport)
            .send_data(data.as_object().cloned().unwrap())
            .await
            .unwrap();
        assert_eq!(task.status.state, TaskState::Submitted);
    }

    #[tokio::test]
    async fn test_discover() {
        let transport = MockTransport::new(|req| {
            assert_eq!(req.endpoint, "/.well-known/agent.json");
            assert!(req.body.is_empty());
            let card = AgentCard::new("Test Agent", "http://mock.local/", "1.0.0");
            TransportResponse::new(200).body(Bytes::from(serde_json::to_vec(&card).unwrap()))
        });

        let card = client(transport).discover().await.unwrap();
        assert_eq!(card.name, "Test Agent");
    }

    #[tokio::test]
    async fn test_poll_until_complete() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let transport = MockTransport::new(move |_req| {
            let state = if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                TaskState::Working
            } else {
                TaskState::Completed
            };
            task_body(
                Task::new("task-1", "s", Message::user("x")).with_status(TaskStatus::new(state)),
            )
        });

        let task = client(transport)
            .poll_until_complete("task-1", Duration::from_millis(1), 10)
            .await
            .unwrap();

        assert_eq!(task.status.state, TaskState::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_gives_up() {
        let transport = MockTransport::new(|_req| {
            task_body(Task::new("task-1", "s", Message::user("x")))
        });

        let result = client(transport)
            .poll_until_complete("task-1", Duration::from_millis(1), 2)
            .await;
        assert!(matches!(result, Err(A2AError::Timeout)));
    }
}
