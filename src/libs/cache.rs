//! Versioned client-side cache of tasks.
//!
//! The cache holds the task list, detail entries per task id and the
//! bookkeeping for mutations that have been applied optimistically but not
//! yet confirmed by the store. It is plain data: the synchronization layer
//! owns one instance and is the only writer.
//!
//! ## Mutation protocol
//!
//! ```text
//! begin_create / begin_update  -> MutationId          (Pending)
//!        |                    |
//!   commit(id, task)      rollback(id)
//!    (Committed)          (RolledBack)
//!        \__ invalidate_tasks() __/                    (Idle)
//! ```
//!
//! Each `begin_*` call stores a [`Snapshot`] of the list under the returned
//! [`MutationId`]. `rollback` restores that snapshot when nothing else has
//! written to the cache since the optimistic edit, and otherwise undoes only
//! the edit itself so interleaved mutations keep their own changes.

use crate::libs::task::{get_all_subtasks, Task, TaskDetail, TaskPatch};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Prefix of the identifiers given to optimistic placeholders.
pub const PLACEHOLDER_PREFIX: &str = "temp-";

/// Correlation token of one in-flight mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(u64);

impl MutationId {
    /// Identifier carried by the placeholder a create mutation inserts.
    pub fn placeholder_id(&self) -> String {
        format!("{}{}", PLACEHOLDER_PREFIX, self.0)
    }
}

/// Handed out before a list or detail fetch; the fetched data is only written back if
/// no mutation started in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    epoch: u64,
}

/// Copy of the task list taken right before an optimistic edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub tasks: Option<Vec<Task>>,
    pub version: u64,
}

impl Snapshot {
    fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.as_ref()?.iter().find(|task| task.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MutationKind {
    Create,
    Update { id: String },
}

#[derive(Debug, Clone)]
struct PendingMutation {
    kind: MutationKind,
    snapshot: Snapshot,
    // Cache version right after the optimistic edit.
    applied_version: u64,
    // Value written by an optimistic update; a targeted undo only restores
    // the snapshot copy while the cache still holds it.
    optimistic: Option<Task>,
}

/// Optimistic edit applied to an existing cached task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimisticEdit {
    /// Merge a patch, keeping `completedAt` in step with `isCompleted`.
    Patch(TaskPatch),
    /// Flip the completion flag.
    Toggle,
}

#[derive(Debug, Default)]
pub struct TaskCache {
    tasks: Option<Vec<Task>>,
    tasks_stale: bool,
    details: HashMap<String, TaskDetail>,
    stale_details: HashSet<String>,
    version: u64,
    fetch_epoch: u64,
    next_mutation: u64,
    pending: HashMap<MutationId, PendingMutation>,
}

impl TaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic counter bumped by every write to the task list.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn tasks(&self) -> Option<&[Task]> {
        self.tasks.as_deref()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.as_ref()?.iter().find(|task| task.id == id)
    }

    /// Cached list if it exists and has not been invalidated.
    pub fn fresh_tasks(&self) -> Option<&[Task]> {
        if self.tasks_stale {
            None
        } else {
            self.tasks()
        }
    }

    pub fn is_stale(&self) -> bool {
        self.tasks_stale
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = Some(tasks);
        self.tasks_stale = false;
        self.version += 1;
    }

    /// Marks the list and every detail entry for re-fetch. Data stays
    /// readable until it is replaced.
    pub fn invalidate_tasks(&mut self) {
        self.tasks_stale = true;
        self.stale_details.extend(self.details.keys().cloned());
        debug!(version = self.version, "task list invalidated");
    }

    pub fn detail(&self, id: &str) -> Option<&TaskDetail> {
        if self.stale_details.contains(id) {
            return None;
        }
        self.details.get(id)
    }

    pub fn set_detail(&mut self, detail: TaskDetail) {
        self.stale_details.remove(&detail.task.id);
        self.details.insert(detail.task.id.clone(), detail);
    }

    pub fn remove_detail(&mut self, id: &str) {
        self.details.remove(id);
        self.stale_details.remove(id);
    }

    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket {
            epoch: self.fetch_epoch,
        }
    }

    /// Writes fetched data unless a mutation cancelled the fetch. Returns
    /// whether the data was stored.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, tasks: Vec<Task>) -> bool {
        if ticket.epoch != self.fetch_epoch {
            debug!(epoch = ticket.epoch, current = self.fetch_epoch, "list fetch cancelled by a mutation");
            return false;
        }
        self.set_tasks(tasks);
        true
    }

    /// Same as [`complete_fetch`](Self::complete_fetch) for a detail entry.
    pub fn complete_detail_fetch(&mut self, ticket: FetchTicket, detail: TaskDetail) -> bool {
        if ticket.epoch != self.fetch_epoch {
            debug!(task = %detail.task.id, "detail fetch cancelled by a mutation");
            return false;
        }
        self.set_detail(detail);
        true
    }

    // Every optimistic write cancels list fetches that are still in flight.
    fn start_mutation(&mut self, kind: MutationKind) -> MutationId {
        self.fetch_epoch += 1;
        self.next_mutation += 1;
        let id = MutationId(self.next_mutation);
        let snapshot = Snapshot {
            tasks: self.tasks.clone(),
            version: self.version,
        };
        self.pending.insert(
            id,
            PendingMutation {
                kind,
                snapshot,
                applied_version: self.version,
                optimistic: None,
            },
        );
        id
    }

    fn mark_applied(&mut self, id: MutationId) {
        self.version += 1;
        if let Some(pending) = self.pending.get_mut(&id) {
            pending.applied_version = self.version;
        }
    }

    /// Prepends a placeholder built by `build` from the mutation's
    /// placeholder id. The placeholder is later matched by that id, never by
    /// position.
    pub fn begin_create(&mut self, build: impl FnOnce(String) -> Task) -> MutationId {
        let id = self.start_mutation(MutationKind::Create);
        let placeholder = build(id.placeholder_id());
        self.tasks.get_or_insert_with(Vec::new).insert(0, placeholder);
        self.mark_applied(id);
        debug!(mutation = ?id, "optimistic create pending");
        id
    }

    /// Applies `edit` to the cached task `task_id`, if it is cached.
    pub fn begin_update(&mut self, task_id: &str, edit: &OptimisticEdit, now: DateTime<Utc>) -> MutationId {
        let id = self.start_mutation(MutationKind::Update {
            id: task_id.to_string(),
        });
        let edited = self.tasks.as_mut().and_then(|tasks| tasks.iter_mut().find(|task| task.id == task_id)).map(|task| {
            *task = match edit {
                OptimisticEdit::Patch(patch) => task.apply_patch(patch, now),
                OptimisticEdit::Toggle => task.toggle_complete(now),
            };
            task.clone()
        });
        if edited.is_some() {
            self.mark_applied(id);
            if let Some(pending) = self.pending.get_mut(&id) {
                pending.optimistic = edited.clone();
            }
        }
        debug!(mutation = ?id, task = task_id, applied = edited.is_some(), "optimistic update pending");
        id
    }

    /// Replaces the optimistic value with the store's canonical record.
    pub fn commit(&mut self, id: MutationId, task: Task) {
        let Some(pending) = self.pending.remove(&id) else {
            warn!(mutation = ?id, "commit for unknown mutation");
            return;
        };
        let target = match pending.kind {
            MutationKind::Create => id.placeholder_id(),
            MutationKind::Update { id: task_id } => task_id,
        };

        if let Some(tasks) = self.tasks.as_mut() {
            match tasks.iter_mut().find(|cached| cached.id == target) {
                Some(slot) => *slot = task.clone(),
                None => debug!(mutation = ?id, "optimistic entry no longer cached"),
            }
            self.version += 1;
        }
        if self.details.contains_key(&task.id) {
            self.stale_details.insert(task.id.clone());
        }
        debug!(mutation = ?id, task = %task.id, "mutation committed");
    }

    /// Undoes the optimistic edit of a failed mutation.
    ///
    /// A rollback without a registered snapshot is a bug in the caller: it
    /// panics in debug builds and does nothing in release builds.
    pub fn rollback(&mut self, id: MutationId) {
        let Some(pending) = self.pending.remove(&id) else {
            debug_assert!(false, "rollback without snapshot for {:?}", id);
            return;
        };

        if pending.applied_version == self.version {
            self.tasks = pending.snapshot.tasks;
            self.version += 1;
            debug!(mutation = ?id, "mutation rolled back to snapshot");
            return;
        }

        let Some(tasks) = self.tasks.as_mut() else {
            return;
        };
        match &pending.kind {
            MutationKind::Create => {
                let placeholder = id.placeholder_id();
                tasks.retain(|task| task.id != placeholder);
            }
            MutationKind::Update { id: task_id } => {
                // A later commit or edit owns the slot now.
                if let (Some(previous), Some(optimistic)) = (pending.snapshot.task(task_id), &pending.optimistic) {
                    match tasks.iter_mut().find(|task| task.id == *task_id) {
                        Some(slot) if slot == optimistic => *slot = previous.clone(),
                        Some(_) => debug!(mutation = ?id, task = %task_id, "task superseded, undo skipped"),
                        None => {}
                    }
                }
            }
        }
        self.version += 1;
        debug!(mutation = ?id, "optimistic edit undone");
    }

    /// Drops `id` and all of its transitive subtasks from the cached list.
    pub fn remove_task_tree(&mut self, id: &str) {
        self.fetch_epoch += 1;
        if let Some(tasks) = self.tasks.as_mut() {
            let mut doomed: HashSet<String> =
                get_all_subtasks(tasks, id).into_iter().map(|task| task.id.clone()).collect();
            doomed.insert(id.to_string());
            tasks.retain(|task| !doomed.contains(&task.id));
            for removed in &doomed {
                self.details.remove(removed);
                self.stale_details.remove(removed);
            }
            self.version += 1;
        }
    }
}
