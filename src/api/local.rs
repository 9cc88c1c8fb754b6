//! In-process task store backed by SQLite.
//!
//! Plays the role of the mocked REST backend: it assigns identifiers and
//! timestamps, answers detail requests with subtasks and parent, cascades
//! deletes to every transitive subtask, and can be told to be slow or to
//! fail every request with a server error.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use taskboard::api::{LocalTaskStore, TaskStore};
//!
//! # async fn run() -> Result<(), taskboard::libs::error::TaskError> {
//! let store = LocalTaskStore::in_memory()?.with_latency(Duration::from_millis(200));
//! store.seed()?;
//! assert_eq!(store.list_tasks().await?.len(), 2);
//!
//! store.fail_with(Some(500));
//! assert!(store.list_tasks().await.is_err());
//! # Ok(())
//! # }
//! ```

use super::TaskStore;
use crate::db::tasks::Tasks;
use crate::libs::error::TaskError;
use crate::libs::messages::Message;
use crate::libs::task::{get_all_subtasks, NewTask, Task, TaskDetail, TaskPatch, TaskPriority, TaskStatus};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, info};

pub struct LocalTaskStore {
    tasks: Mutex<Tasks>,
    latency: Duration,
    failure: Mutex<Option<u16>>,
}

fn sample_tasks() -> Vec<NewTask> {
    let due = |day: u32| -> Option<DateTime<Utc>> { Utc.with_ymd_and_hms(2025, 3, day, 0, 0, 0).single() };

    vec![
        NewTask {
            title: "Build the task manager".to_string(),
            description: Some("Task model, optimistic sync layer and a mocked task store".to_string()),
            status: TaskStatus::InProgress,
            priority: TaskPriority::High,
            due_date: due(28),
            parent_id: None,
            tags: vec!["core".to_string(), "rust".to_string()],
            is_completed: false,
            recurrence_rule: None,
        },
        NewTask {
            title: "Test the mock store".to_string(),
            description: Some("Cover the store handlers with tests".to_string()),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: due(22),
            parent_id: None,
            tags: vec!["test".to_string(), "mock".to_string()],
            is_completed: false,
            recurrence_rule: None,
        },
    ]
}

fn open_error(error: anyhow::Error) -> TaskError {
    TaskError::fetch(Some(500), error.to_string())
}

impl LocalTaskStore {
    /// Store over the task database in the application data directory.
    pub fn open() -> Result<Self, TaskError> {
        Ok(Self::from_tasks(Tasks::new().map_err(open_error)?))
    }

    /// Store over a private in-memory database.
    pub fn in_memory() -> Result<Self, TaskError> {
        Ok(Self::from_tasks(Tasks::in_memory().map_err(open_error)?))
    }

    fn from_tasks(tasks: Tasks) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            latency: Duration::ZERO,
            failure: Mutex::new(None),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// With `Some(status)` every following request fails with that status
    /// and an internal server error message; `None` restores normal service.
    pub fn fail_with(&self, status: Option<u16>) {
        *self.failure.lock() = status;
    }

    /// Inserts the sample tasks if the store is empty. Returns how many
    /// tasks were added.
    pub fn seed(&self) -> Result<usize, TaskError> {
        let mut tasks = self.tasks.lock();
        if tasks.count()? > 0 {
            return Ok(0);
        }

        let now = Utc::now();
        let samples = sample_tasks();
        for new_task in &samples {
            tasks.save(&Task::create(new_task.clone(), now))?;
        }
        info!(count = samples.len(), "local store seeded");
        Ok(samples.len())
    }

    // Simulated network round trip.
    async fn respond(&self) -> Result<(), TaskError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(status) = *self.failure.lock() {
            debug!(status, "local store failing request");
            return Err(TaskError::fetch(Some(status), Message::InternalServerError.to_string()));
        }
        Ok(())
    }
}

impl TaskStore for LocalTaskStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, TaskError> {
        self.respond().await?;
        Ok(self.tasks.lock().fetch_all()?)
    }

    async fn get_task_detail(&self, id: &str) -> Result<TaskDetail, TaskError> {
        self.respond().await?;
        let tasks = self.tasks.lock().fetch_all()?;
        TaskDetail::from_tasks(&tasks, id).ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    async fn create_task(&self, new_task: &NewTask) -> Result<Task, TaskError> {
        self.respond().await?;
        let task = Task::create(new_task.clone(), Utc::now());
        self.tasks.lock().save(&task)?;
        debug!(task = %task.id, "local store created task");
        Ok(task)
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, TaskError> {
        self.respond().await?;
        let patch = patch.clone().validate()?;

        let mut tasks = self.tasks.lock();
        let existing = tasks.get(id)?.ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        let updated = existing.apply_patch(&patch, Utc::now());
        tasks.save(&updated)?;
        debug!(task = id, "local store updated task");
        Ok(updated)
    }

    async fn delete_task(&self, id: &str) -> Result<(), TaskError> {
        self.respond().await?;

        let mut tasks = self.tasks.lock();
        let all = tasks.fetch_all()?;
        if !all.iter().any(|task| task.id == id) {
            return Err(TaskError::NotFound(id.to_string()));
        }

        let mut ids: Vec<String> = vec![id.to_string()];
        ids.extend(get_all_subtasks(&all, id).into_iter().map(|task| task.id.clone()));
        let removed = tasks.delete_many(&ids)?;
        debug!(task = id, removed, "local store deleted task tree");
        Ok(())
    }
}
