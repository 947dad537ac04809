//! Task dispatch: submission, handler invocation and event production

use std::{any::Any, future::Future, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::{
    stream::{self, BoxStream, StreamExt},
    FutureExt,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::{
    config::ServerConfig,
    protocol::{
        error::A2AResult,
        message::Message,
        task::{Task, TaskQueryParams, TaskSendParams, TaskState, TaskStreamEvent},
    },
    server::{
        handler::{HandlerError, HandlerId, HandlerResult, StreamingHandler, UnaryHandler},
        registry::{EvictionPolicy, TaskRegistry},
    },
};

/// Default bound on a single handler invocation
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(300);

/// Events of one streamed task; ends right after the final event
pub type TaskEventStream = BoxStream<'static, TaskStreamEvent>;

/// Owns the task registry and the registered handlers
///
/// Register handlers first, then share the manager behind an `Arc`. Every
/// accepted task gets its own detached processing routine which runs the
/// handlers sequentially in registration order.
pub struct TaskManager {
    registry: TaskRegistry,
    handlers: Vec<(HandlerId, Arc<dyn UnaryHandler>)>,
    streaming_handlers: Vec<(HandlerId, Arc<dyn StreamingHandler>)>,
    handler_timeout: Option<Duration>,
}

impl TaskManager {
    pub fn new(registry: TaskRegistry) -> Self {
        Self {
            registry,
            handlers: Vec::new(),
            streaming_handlers: Vec::new(),
            handler_timeout: Some(DEFAULT_HANDLER_TIMEOUT),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(TaskRegistry::new(config.eviction.clone()))
            .with_handler_timeout(config.handler_timeout())
    }

    /// Bound each handler call and each chunk wait; `None` waits forever
    pub fn with_handler_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn register_handler<H>(&mut self, handler: H) -> HandlerId
    where
        H: UnaryHandler + 'static,
    {
        let id = HandlerId::new();
        self.handlers.push((id, Arc::new(handler)));
        debug!(handler_id = %id, "registered unary handler");
        id
    }

    pub fn register_streaming_handler<H>(&mut self, handler: H) -> HandlerId
    where
        H: StreamingHandler + 'static,
    {
        let id = HandlerId::new();
        self.streaming_handlers.push((id, Arc::new(handler)));
        debug!(handler_id = %id, "registered streaming handler");
        id
    }

    /// Accept a task and process it in the background
    ///
    /// Returns the task as submitted. Handler failures never surface here;
    /// they move the task to `failed`.
    pub async fn on_send_task(&self, params: TaskSendParams) -> A2AResult<Task> {
        let task = self
            .registry
            .submit(&params.id, &params.session_id, params.message.clone())
            .await?;
        info!(task_id = %task.id, session_id = %params.session_id, "task submitted");

        let processor = self.processor(&task.id, EventSink::detached());
        let handle = tokio::spawn(processor.run_unary(params.message));
        self.registry.attach_handle(&task.id, handle).await;

        Ok(match params.history_length {
            Some(limit) => task.with_history_limit(limit),
            None => task,
        })
    }

    /// Accept a task and stream its lifecycle events
    ///
    /// The stream yields `submitted`, `working`, one artifact event per result
    /// and exactly one final status event. Dropping the stream does not stop
    /// processing.
    pub async fn on_send_task_streaming(
        &self,
        params: TaskSendParams,
    ) -> A2AResult<TaskEventStream> {
        let task = self
            .registry
            .submit(&params.id, &params.session_id, params.message.clone())
            .await?;
        info!(task_id = %task.id, session_id = %params.session_id, "streaming task submitted");

        let (tx, rx) = mpsc::unbounded_channel();
        let events = EventSink::attached(tx);
        events.send(TaskStreamEvent::status(&task.id, task.status.clone()));

        let processor = self.processor(&task.id, events);
        let handle = tokio::spawn(processor.run_streaming(params.message));
        self.registry.attach_handle(&task.id, handle).await;

        Ok(until_final(rx))
    }

    /// Look up a task, keeping at most `historyLength` recent messages
    pub async fn on_get_task(&self, params: TaskQueryParams) -> A2AResult<Task> {
        let task = self.registry.get(&params.id).await?;
        Ok(match params.history_length {
            Some(limit) => task.with_history_limit(limit),
            None => task,
        })
    }

    fn processor(&self, task_id: &str, events: EventSink) -> TaskProcessor {
        TaskProcessor {
            task_id: task_id.to_string(),
            registry: self.registry.clone(),
            handlers: self.handlers.iter().map(|(_, h)| h.clone()).collect(),
            streaming_handlers: self
                .streaming_handlers
                .iter()
                .map(|(_, h)| h.clone())
                .collect(),
            handler_timeout: self.handler_timeout,
            events,
        }
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new(TaskRegistry::new(EvictionPolicy::default()))
    }
}

fn until_final(rx: UnboundedReceiver<TaskStreamEvent>) -> TaskEventStream {
    stream::unfold((rx, false), |(mut rx, done)| async move {
        if done {
            return None;
        }
        let event = rx.recv().await?;
        let done = event.is_final();
        Some((event, (rx, done)))
    })
    .boxed()
}

/// Where a processing routine reports events; unary tasks have nowhere
struct EventSink(Option<UnboundedSender<TaskStreamEvent>>);

impl EventSink {
    fn detached() -> Self {
        Self(None)
    }

    fn attached(tx: UnboundedSender<TaskStreamEvent>) -> Self {
        Self(Some(tx))
    }

    fn send(&self, event: TaskStreamEvent) {
        if let Some(tx) = &self.0 {
            if tx.send(event).is_err() {
                debug!("stream consumer gone, continuing without it");
            }
        }
    }
}

/// The detached routine driving one task to a terminal state
struct TaskProcessor {
    task_id: String,
    registry: TaskRegistry,
    handlers: Vec<Arc<dyn UnaryHandler>>,
    streaming_handlers: Vec<Arc<dyn StreamingHandler>>,
    handler_timeout: Option<Duration>,
    events: EventSink,
}

impl TaskProcessor {
    async fn run_unary(self, message: Message) {
        if self.start().await {
            let outcome = self.run_unary_handlers(&message).await;
            self.finish(outcome).await;
        }
    }

    async fn run_streaming(self, message: Message) {
        if self.start().await {
            let outcome = if self.streaming_handlers.is_empty() {
                debug!(task_id = %self.task_id, "no streaming handlers, falling back to unary");
                self.run_unary_handlers(&message).await
            } else {
                self.run_streaming_handlers(&message).await
            };
            self.finish(outcome).await;
        }
    }

    async fn start(&self) -> bool {
        match self
            .registry
            .transition(&self.task_id, TaskState::Working, None)
            .await
        {
            Ok(status) => {
                self.events
                    .send(TaskStreamEvent::status(&self.task_id, status));
                true
            }
            Err(err) => {
                error!(task_id = %self.task_id, error = %err, "could not start task");
                false
            }
        }
    }

    async fn run_unary_handlers(&self, message: &Message) -> Result<(), HandlerError> {
        for handler in &self.handlers {
            let result = self.guarded(handler.handle(message.clone())).await??;
            self.publish(result).await;
        }
        Ok(())
    }

    async fn run_streaming_handlers(&self, message: &Message) -> Result<(), HandlerError> {
        for handler in &self.streaming_handlers {
            let mut chunks = std::panic::catch_unwind(AssertUnwindSafe(|| {
                handler.stream(message.clone())
            }))
            .map_err(|payload| HandlerError::Panicked(panic_message(payload.as_ref())))?;

            while let Some(chunk) = self.guarded(chunks.next()).await? {
                self.publish(chunk?).await;
            }
        }
        Ok(())
    }

    /// Await `fut` under the handler timeout, turning panics into errors
    async fn guarded<T>(&self, fut: impl Future<Output = T>) -> Result<T, HandlerError> {
        let fut = AssertUnwindSafe(fut).catch_unwind();
        let caught = match self.handler_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| HandlerError::Timeout(limit))?,
            None => fut.await,
        };
        caught.map_err(|payload| HandlerError::Panicked(panic_message(payload.as_ref())))
    }

    async fn publish(&self, result: HandlerResult) {
        let Some(artifact) = result.into_artifact() else {
            warn!(task_id = %self.task_id, "unsupported handler result, skipping");
            return;
        };

        match self
            .registry
            .append_artifact(&self.task_id, artifact.clone())
            .await
        {
            Ok(()) => self
                .events
                .send(TaskStreamEvent::artifact(&self.task_id, artifact)),
            Err(err) => error!(task_id = %self.task_id, error = %err, "could not store artifact"),
        }
    }

    async fn finish(&self, outcome: Result<(), HandlerError>) {
        let (state, message) = match outcome {
            Ok(()) => {
                info!(task_id = %self.task_id, "task completed");
                (TaskState::Completed, None)
            }
            Err(err) => {
                error!(task_id = %self.task_id, error = %err, "task failed");
                (TaskState::Failed, Some(Message::agent(err.to_string())))
            }
        };

        match self.registry.transition(&self.task_id, state, message).await {
            Ok(status) => self
                .events
                .send(TaskStreamEvent::status(&self.task_id, status)),
            Err(err) => error!(task_id = %self.task_id, error = %err, "could not finish task"),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
