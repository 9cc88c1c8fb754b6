//! Task store clients.
//!
//! The synchronization layer talks to a task store through the [`TaskStore`]
//! trait, which mirrors the REST contract:
//!
//! | operation | request | success |
//! |---|---|---|
//! | list | `GET /tasks` | `{tasks: Task[]}` |
//! | detail | `GET /tasks/{id}` | `{task, subtasks, parentTask}` |
//! | create | `POST /tasks` | `Task`, 201 |
//! | update | `PUT /tasks/{id}` | `Task`, 200 |
//! | delete | `DELETE /tasks/{id}` | 204 |
//!
//! Failures carry an [`ApiErrorResponse`] body.
//!
//! ## Implementations
//!
//! - **[`local::LocalTaskStore`]**: in-process mock backend persisted in SQLite
//! - **[`http::HttpTaskStore`]**: REST client for a real server
//! - **[`Backend`]**: picks one of the two from the configuration
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskboard::api::{local::LocalTaskStore, TaskStore};
//!
//! # async fn run() -> Result<(), taskboard::libs::error::TaskError> {
//! let store = LocalTaskStore::open()?;
//! let tasks = store.list_tasks().await?;
//! # Ok(())
//! # }
//! ```

use crate::libs::config::Config;
use crate::libs::error::{TaskError, ValidationError};
use crate::libs::task::{NewTask, Task, TaskDetail, TaskPatch};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod http;
pub mod local;

pub use http::HttpTaskStore;
pub use local::LocalTaskStore;

/// Body of `GET /tasks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksResponse {
    pub tasks: Vec<Task>,
}

/// Error body returned by the store for any failed request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationError>,
}

/// Remote task store as seen by the synchronization layer.
///
/// Futures returned by these methods are not required to be `Send`; the
/// layer drives them on a single-threaded event loop.
#[allow(async_fn_in_trait)]
pub trait TaskStore {
    /// Fetches every task.
    async fn list_tasks(&self) -> Result<Vec<Task>, TaskError>;

    /// Fetches one task with its direct subtasks and its parent.
    ///
    /// # Errors
    ///
    /// [`TaskError::NotFound`] when `id` does not resolve.
    async fn get_task_detail(&self, id: &str) -> Result<TaskDetail, TaskError>;

    /// Creates a task; the store assigns id and timestamps.
    async fn create_task(&self, new_task: &NewTask) -> Result<Task, TaskError>;

    /// Applies a partial update and returns the canonical record.
    ///
    /// # Errors
    ///
    /// [`TaskError::NotFound`] when `id` does not resolve.
    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, TaskError>;

    /// Deletes a task together with all of its subtasks.
    ///
    /// # Errors
    ///
    /// [`TaskError::NotFound`] when `id` does not resolve.
    async fn delete_task(&self, id: &str) -> Result<(), TaskError>;
}

/// Store selected by the configuration: the HTTP client when a server is
/// configured, the local SQLite-backed store otherwise.
pub enum Backend {
    Local(LocalTaskStore),
    Http(HttpTaskStore),
}

impl Backend {
    pub fn from_config(config: &Config) -> Result<Self, TaskError> {
        match &config.server {
            Some(server) => Ok(Backend::Http(HttpTaskStore::new(server))),
            None => {
                let settings = config.store.clone().unwrap_or_default();
                let store = LocalTaskStore::open()?.with_latency(Duration::from_millis(settings.latency_ms));
                if settings.seed {
                    store.seed()?;
                }
                Ok(Backend::Local(store))
            }
        }
    }
}

impl TaskStore for Backend {
    async fn list_tasks(&self) -> Result<Vec<Task>, TaskError> {
        match self {
            Backend::Local(store) => store.list_tasks().await,
            Backend::Http(store) => store.list_tasks().await,
        }
    }

    async fn get_task_detail(&self, id: &str) -> Result<TaskDetail, TaskError> {
        match self {
            Backend::Local(store) => store.get_task_detail(id).await,
            Backend::Http(store) => store.get_task_detail(id).await,
        }
    }

    async fn create_task(&self, new_task: &NewTask) -> Result<Task, TaskError> {
        match self {
            Backend::Local(store) => store.create_task(new_task).await,
            Backend::Http(store) => store.create_task(new_task).await,
        }
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, TaskError> {
        match self {
            Backend::Local(store) => store.update_task(id, patch).await,
            Backend::Http(store) => store.update_task(id, patch).await,
        }
    }

    async fn delete_task(&self, id: &str) -> Result<(), TaskError> {
        match self {
            Backend::Local(store) => store.delete_task(id).await,
            Backend::Http(store) => store.delete_task(id).await,
        }
    }
}
