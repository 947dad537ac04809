//! In-memory task registry and lifecycle enforcement

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use serde::Deserialize;
use thiserror::Error;
use tokio::{sync::RwLock, task::JoinHandle};
use tracing::{debug, warn};

use crate::protocol::{
    message::Message,
    task::{Task, TaskState, TaskStatus},
    Artifact,
};

/// Registry-level failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("Task already exists: {task_id}")]
    DuplicateTask { task_id: String },

    #[error("Task {task_id} cannot move from {from} to {to}")]
    InvalidTransition {
        task_id: String,
        from: TaskState,
        to: TaskState,
    },
}

/// When finished tasks are dropped from the registry
///
/// The default keeps every task for the lifetime of the process.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvictionPolicy {
    /// Drop terminal tasks this many seconds after they finished
    pub ttl_secs: Option<u64>,

    /// Soft cap on retained tasks; the oldest terminal tasks go first
    pub max_tasks: Option<usize>,

    /// How often the background sweeper runs when a TTL is set
    pub sweep_interval_secs: u64,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            ttl_secs: None,
            max_tasks: None,
            sweep_interval_secs: 60,
        }
    }
}

impl EvictionPolicy {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

#[derive(Debug)]
struct TaskEntry {
    task: Task,
    handle: Option<JoinHandle<()>>,
    finished_at: Option<Instant>,
}

/// Shared store of every known task
///
/// Cloning is cheap and every clone sees the same tasks. Each task is only
/// mutated by the processing routine that owns it.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<String, TaskEntry>>>,
    policy: EvictionPolicy,
}

impl TaskRegistry {
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            tasks: Arc::default(),
            policy,
        }
    }

    pub fn policy(&self) -> &EvictionPolicy {
        &self.policy
    }

    /// Store a new `submitted` task whose history starts with `message`
    pub async fn submit(
        &self,
        task_id: &str,
        session_id: &str,
        message: Message,
    ) -> Result<Task, RegistryError> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(task_id) {
            return Err(RegistryError::DuplicateTask {
                task_id: task_id.to_string(),
            });
        }

        if let Some(max) = self.policy.max_tasks {
            if tasks.len() >= max {
                let excess = tasks.len() + 1 - max;
                let evicted = evict_oldest_finished(&mut tasks, excess);
                debug!(evicted, max_tasks = max, "evicted finished tasks to make room");
                if tasks.len() >= max {
                    warn!(max_tasks = max, "task limit exceeded, no finished tasks to evict");
                }
            }
        }

        let task = Task::new(task_id, session_id, message);
        tasks.insert(
            task_id.to_string(),
            TaskEntry {
                task: task.clone(),
                handle: None,
                finished_at: None,
            },
        );
        Ok(task)
    }

    pub async fn get(&self, task_id: &str) -> Result<Task, RegistryError> {
        self.tasks
            .read()
            .await
            .get(task_id)
            .map(|entry| entry.task.clone())
            .ok_or_else(|| not_found(task_id))
    }

    /// Move a task to `state`, recording `message` in its status and history
    pub async fn transition(
        &self,
        task_id: &str,
        state: TaskState,
        message: Option<Message>,
    ) -> Result<TaskStatus, RegistryError> {
        let mut tasks = self.tasks.write().await;
        let entry = tasks.get_mut(task_id).ok_or_else(|| not_found(task_id))?;

        let current = entry.task.status.state;
        if !current.can_transition_to(state) {
            return Err(RegistryError::InvalidTransition {
                task_id: task_id.to_string(),
                from: current,
                to: state,
            });
        }

        let mut status = TaskStatus::new(state);
        if let Some(message) = message {
            entry.task.history.push(message.clone());
            status = status.with_message(message);
        }
        entry.task.status = status.clone();

        if state.is_terminal() {
            entry.finished_at = Some(Instant::now());
        }

        Ok(status)
    }

    /// Append an artifact; finished tasks accept no more output
    pub async fn append_artifact(
        &self,
        task_id: &str,
        artifact: Artifact,
    ) -> Result<(), RegistryError> {
        let mut tasks = self.tasks.write().await;
        let entry = tasks.get_mut(task_id).ok_or_else(|| not_found(task_id))?;

        let state = entry.task.status.state;
        if state.is_terminal() {
            return Err(RegistryError::InvalidTransition {
                task_id: task_id.to_string(),
                from: state,
                to: state,
            });
        }

        entry.task.artifacts.push(artifact);
        Ok(())
    }

    /// Keep the handle of the routine processing `task_id`
    ///
    /// The handle is dropped, detaching the routine, if the task is gone.
    pub async fn attach_handle(&self, task_id: &str, handle: JoinHandle<()>) {
        match self.tasks.write().await.get_mut(task_id) {
            Some(entry) => entry.handle = Some(handle),
            None => debug!(task_id, "task evicted before its handle was attached"),
        }
    }

    /// Whether the routine processing `task_id` has exited
    pub async fn is_settled(&self, task_id: &str) -> Result<bool, RegistryError> {
        let tasks = self.tasks.read().await;
        let entry = tasks.get(task_id).ok_or_else(|| not_found(task_id))?;
        Ok(entry.handle.as_ref().is_some_and(JoinHandle::is_finished))
    }

    /// Drop terminal tasks that finished at least one TTL before `now`
    pub async fn evict_expired(&self, now: Instant) -> usize {
        let Some(ttl) = self.policy.ttl() else {
            return 0;
        };

        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, entry| match entry.finished_at {
            Some(finished) => now.saturating_duration_since(finished) < ttl,
            None => true,
        });
        before - tasks.len()
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Start the periodic TTL sweep, if the policy has a TTL
    pub fn spawn_sweeper(&self) -> Option<JoinHandle<()>> {
        self.policy.ttl()?;

        let registry = self.clone();
        let period = Duration::from_secs(self.policy.sweep_interval_secs.max(1));
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let evicted = registry.evict_expired(Instant::now()).await;
                if evicted > 0 {
                    debug!(evicted, "evicted expired tasks");
                }
            }
        }))
    }
}

fn not_found(task_id: &str) -> RegistryError {
    RegistryError::TaskNotFound {
        task_id: task_id.to_string(),
    }
}

fn evict_oldest_finished(tasks: &mut HashMap<String, TaskEntry>, count: usize) -> usize {
    let mut finished: Vec<(Instant, String)> = tasks
        .iter()
        .filter_map(|(id, entry)| entry.finished_at.map(|at| (at, id.clone())))
        .collect();
    finished.sort();

    let mut evicted = 0;
    for (_, id) in finished.into_iter().take(count) {
        tasks.remove(&id);
        evicted += 1;
    }
    evicted
}
