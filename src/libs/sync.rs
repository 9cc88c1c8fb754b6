//! Task synchronization layer.
//!
//! [`TaskSync`] sits between callers and a [`TaskStore`]. Reads go to the
//! store and land in the cache; writes are applied to the cache first, sent
//! to the store, then either reconciled with the store's answer or rolled
//! back. Whatever the outcome, the task list is marked stale afterwards so
//! the next read comes from the store.
//!
//! The cache sits behind a mutex that is only held between awaits, never
//! across one, so mutations issued concurrently from the same event loop
//! interleave safely. Overlapping updates of the same task are not ordered:
//! the last response to arrive wins. Failures are never retried here.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskboard::api::LocalTaskStore;
//! use taskboard::libs::sync::TaskSync;
//! use taskboard::libs::task::TaskPatch;
//!
//! # async fn run() -> Result<(), taskboard::libs::error::TaskError> {
//! let sync = TaskSync::new(LocalTaskStore::in_memory()?);
//! let tasks = sync.list_tasks().await?;
//! if let Some(first) = tasks.first() {
//!     let patch = TaskPatch { is_completed: Some(true), ..Default::default() };
//!     sync.update_task(&first.id, patch).await?;
//! }
//! # Ok(())
//! # }
//! ```

use crate::api::TaskStore;
use crate::libs::cache::{MutationId, OptimisticEdit, TaskCache};
use crate::libs::error::TaskError;
use crate::libs::task::{validate_subtask_creation, NewTask, Task, TaskDetail, TaskPatch};
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, warn};

pub struct TaskSync<S: TaskStore> {
    store: S,
    cache: Mutex<TaskCache>,
}

impl<S: TaskStore> TaskSync<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: Mutex::new(TaskCache::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read access to the cache. Callers get a borrowed view and must not
    /// hold on to it across awaits.
    pub fn with_cache<R>(&self, read: impl FnOnce(&TaskCache) -> R) -> R {
        read(&self.cache.lock())
    }

    /// Copy of the cached task list, without any I/O.
    pub fn cached_tasks(&self) -> Option<Vec<Task>> {
        self.cache.lock().tasks().map(<[Task]>::to_vec)
    }

    /// Fetches every task from the store.
    ///
    /// The result is written to the cache unless a mutation started while
    /// the request was in flight; it is returned to the caller either way.
    ///
    /// # Errors
    ///
    /// Store failures propagate as they are; there is no cached fallback.
    pub async fn list_tasks(&self) -> Result<Vec<Task>, TaskError> {
        let ticket = self.cache.lock().begin_fetch();
        let tasks = self.store.list_tasks().await.inspect_err(|error| {
            warn!(%error, "task list fetch failed");
        })?;

        let stored = self.cache.lock().complete_fetch(ticket, tasks.clone());
        debug!(count = tasks.len(), stored, "task list fetched");
        Ok(tasks)
    }

    /// Cached list when it is present and fresh, a fetch otherwise.
    pub async fn tasks(&self) -> Result<Vec<Task>, TaskError> {
        let cached = self.cache.lock().fresh_tasks().map(<[Task]>::to_vec);
        match cached {
            Some(tasks) => Ok(tasks),
            None => self.list_tasks().await,
        }
    }

    /// Fetches a task with its direct subtasks and its parent.
    ///
    /// # Errors
    ///
    /// [`TaskError::NotFound`] when the store does not know `id`.
    pub async fn get_task_detail(&self, id: &str) -> Result<TaskDetail, TaskError> {
        let ticket = self.cache.lock().begin_fetch();
        let detail = self.store.get_task_detail(id).await?;
        self.cache.lock().complete_detail_fetch(ticket, detail.clone());
        Ok(detail)
    }

    /// Creates a task with an optimistic placeholder.
    ///
    /// For a subtask the parent must already be in the cached list and must
    /// not be a subtask itself; both are checked before the store is
    /// contacted.
    ///
    /// # Errors
    ///
    /// - [`TaskError::ParentNotFound`] when the parent is not cached
    /// - [`TaskError::Validation`] when the parent is a subtask
    /// - any store error, after the placeholder has been removed
    pub async fn create_task(&self, new_task: NewTask) -> Result<Task, TaskError> {
        if let Some(parent_id) = &new_task.parent_id {
            let parent = self
                .cache
                .lock()
                .task(parent_id)
                .cloned()
                .ok_or_else(|| TaskError::ParentNotFound(parent_id.clone()))?;
            validate_subtask_creation(&parent)?;
        }

        let now = Utc::now();
        let mutation = self.cache.lock().begin_create(|placeholder_id| Task::with_id(placeholder_id, new_task.clone(), now));

        let result = self.store.create_task(&new_task).await;
        self.settle(mutation, &result);
        result
    }

    /// Applies a partial update optimistically, keeping `completedAt` in step
    /// with `isCompleted`.
    ///
    /// # Errors
    ///
    /// - [`TaskError::Validation`] for an invalid patch, before any request
    /// - [`TaskError::NotFound`] when the store does not know `id`
    /// - any other store error, after the cached task has been restored
    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task, TaskError> {
        let patch = patch.validate()?;
        self.mutate(id, OptimisticEdit::Patch(patch.clone()), &patch).await
    }

    /// Flips the completion state of a cached task.
    ///
    /// # Errors
    ///
    /// [`TaskError::NotFound`] when the task is not in the cached list, plus
    /// the errors of [`TaskSync::update_task`].
    pub async fn toggle_task(&self, id: &str) -> Result<Task, TaskError> {
        let current = self
            .cache
            .lock()
            .task(id)
            .cloned()
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        let patch = TaskPatch {
            is_completed: Some(!current.is_completed),
            ..Default::default()
        };
        self.mutate(id, OptimisticEdit::Toggle, &patch).await
    }

    /// Deletes a task and, in the store, all of its subtasks. The cached list
    /// drops the same tree once the store confirms.
    pub async fn delete_task(&self, id: &str) -> Result<(), TaskError> {
        self.store.delete_task(id).await.inspect_err(|error| {
            warn!(task = id, %error, "delete failed");
        })?;

        let mut cache = self.cache.lock();
        cache.remove_task_tree(id);
        cache.invalidate_tasks();
        debug!(task = id, "task deleted");
        Ok(())
    }

    async fn mutate(&self, id: &str, edit: OptimisticEdit, patch: &TaskPatch) -> Result<Task, TaskError> {
        let mutation = self.cache.lock().begin_update(id, &edit, Utc::now());
        let result = self.store.update_task(id, patch).await;
        self.settle(mutation, &result);
        result
    }

    // Committed or rolled back, then back to idle with a stale list.
    fn settle(&self, mutation: MutationId, result: &Result<Task, TaskError>) {
        let mut cache = self.cache.lock();
        match result {
            Ok(task) => cache.commit(mutation, task.clone()),
            Err(error) => {
                warn!(mutation = ?mutation, %error, "mutation failed, rolling back");
                cache.rollback(mutation);
            }
        }
        cache.invalidate_tasks();
    }
}
