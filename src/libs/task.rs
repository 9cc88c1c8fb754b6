//! Task model: the task entity, its validation rules and pure transformations.
//!
//! Nothing in here owns state. Every operation takes task values (and the
//! current time where a timestamp is produced) and returns new values, which
//! keeps the model usable from the cache, the local store and tests alike.
//!
//! ## Usage
//!
//! ```rust
//! use chrono::Utc;
//! use taskboard::libs::task::{NewTask, NewTaskInput, Task};
//!
//! let input = NewTaskInput {
//!     title: "  Buy milk  ".to_string(),
//!     status: "todo".to_string(),
//!     priority: "medium".to_string(),
//!     ..Default::default()
//! };
//! let new_task = NewTask::validate(input).unwrap();
//! let task = Task::create(new_task, Utc::now());
//! assert_eq!(task.title, "Buy milk");
//! assert!(task.completed_at.is_none());
//! ```

use crate::libs::error::ValidationError;
use crate::libs::messages::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum title length, counted in characters after trimming.
pub const TITLE_MAX_LENGTH: usize = 100;
/// Maximum description length in characters.
pub const DESCRIPTION_MAX_LENGTH: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl RecurrenceFrequency {
    pub const ALL: [RecurrenceFrequency; 3] = [
        RecurrenceFrequency::Daily,
        RecurrenceFrequency::Weekly,
        RecurrenceFrequency::Monthly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceFrequency::Daily => "daily",
            RecurrenceFrequency::Weekly => "weekly",
            RecurrenceFrequency::Monthly => "monthly",
        }
    }
}

// String conversions for the three closed sets. Parsing is exact: no
// trimming, no case folding, matching the wire values.
macro_rules! choice_strings {
    ($($ty:ty),*) => {$(
        impl FromStr for $ty {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .into_iter()
                    .find(|choice| choice.as_str() == value)
                    .ok_or_else(|| value.to_string())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    )*};
}

choice_strings!(TaskStatus, TaskPriority, RecurrenceFrequency);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub frequency: RecurrenceFrequency,
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

/// Validated data for a task that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<RecurrenceRule>,
}

/// A stored task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<RecurrenceRule>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unchecked task data as it arrives from a form, a command line or a request
/// body. Enum fields are plain strings so that unknown values can be reported
/// instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub recurrence_rule: Option<RecurrenceRuleInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRuleInput {
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub interval: i64,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

/// Unchecked full task record, e.g. a task read back from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub fields: NewTaskInput,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update. `None` leaves a field alone; for the nullable fields
/// `Some(None)` clears the value (JSON `null`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_some")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_some")]
    pub parent_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_some")]
    pub recurrence_rule: Option<Option<RecurrenceRule>>,
}

// Present-but-null becomes `Some(None)` instead of collapsing into `None`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A task together with its direct subtasks and, for a subtask, its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    pub task: Task,
    #[serde(default)]
    pub subtasks: Vec<Task>,
    #[serde(default)]
    pub parent_task: Option<Task>,
}

impl TaskDetail {
    /// Assembles the detail view of `id` out of a full task list.
    pub fn from_tasks(tasks: &[Task], id: &str) -> Option<TaskDetail> {
        let task = tasks.iter().find(|task| task.id == id)?.clone();
        let subtasks = get_subtasks(tasks, id).into_iter().cloned().collect();
        let parent_task = task
            .parent_id
            .as_deref()
            .and_then(|parent_id| tasks.iter().find(|candidate| candidate.id == parent_id))
            .cloned();

        Some(TaskDetail {
            task,
            subtasks,
            parent_task,
        })
    }
}

fn check_title(title: &str, errors: &mut ValidationError) -> Option<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        errors.add("title", Message::TitleRequired.to_string());
        return None;
    }
    if trimmed.chars().count() > TITLE_MAX_LENGTH {
        errors.add("title", Message::TitleTooLong(TITLE_MAX_LENGTH).to_string());
        return None;
    }
    Some(trimmed.to_string())
}

fn check_description(description: Option<&str>, errors: &mut ValidationError) -> bool {
    match description {
        Some(text) if text.chars().count() > DESCRIPTION_MAX_LENGTH => {
            errors.add("description", Message::DescriptionTooLong(DESCRIPTION_MAX_LENGTH).to_string());
            false
        }
        _ => true,
    }
}

fn check_interval(interval: i64, errors: &mut ValidationError) -> Option<u32> {
    match u32::try_from(interval) {
        Ok(value) if value >= 1 => Some(value),
        _ => {
            errors.add("recurrenceRule.interval", Message::InvalidInterval(interval).to_string());
            None
        }
    }
}

fn check_recurrence(rule: RecurrenceRuleInput, errors: &mut ValidationError) -> Option<RecurrenceRule> {
    let frequency = rule.frequency.parse::<RecurrenceFrequency>().map_err(|value| {
        errors.add("recurrenceRule.frequency", Message::InvalidFrequency(value).to_string());
    });
    let interval = check_interval(rule.interval, errors);

    Some(RecurrenceRule {
        frequency: frequency.ok()?,
        interval: interval?,
        end_date: rule.end_date,
    })
}

// Runs every field check, collecting all messages. Returns a value only when
// none of the checks failed.
fn check_fields(input: NewTaskInput, errors: &mut ValidationError) -> Option<NewTask> {
    let before = errors.len();

    let title = check_title(&input.title, errors);
    check_description(input.description.as_deref(), errors);
    let status = input
        .status
        .parse::<TaskStatus>()
        .map_err(|value| errors.add("status", Message::InvalidStatus(value).to_string()))
        .ok();
    let priority = input
        .priority
        .parse::<TaskPriority>()
        .map_err(|value| errors.add("priority", Message::InvalidPriority(value).to_string()))
        .ok();
    let recurrence_rule = match input.recurrence_rule {
        None => Some(None),
        Some(rule) => check_recurrence(rule, errors).map(Some),
    };

    if errors.len() > before {
        return None;
    }

    Some(NewTask {
        title: title?,
        description: input.description,
        status: status?,
        priority: priority?,
        due_date: input.due_date,
        parent_id: input.parent_id,
        tags: input.tags,
        is_completed: input.is_completed,
        recurrence_rule: recurrence_rule?,
    })
}

impl NewTask {
    /// Checks every field constraint and returns the normalized task data
    /// (title trimmed). All violations are reported, not just the first.
    pub fn validate(input: NewTaskInput) -> Result<NewTask, ValidationError> {
        let mut errors = ValidationError::new();
        match check_fields(input, &mut errors) {
            Some(new_task) if errors.is_empty() => Ok(new_task),
            _ => Err(errors),
        }
    }
}

impl From<NewTask> for NewTaskInput {
    fn from(new_task: NewTask) -> Self {
        NewTaskInput {
            title: new_task.title,
            description: new_task.description,
            status: new_task.status.to_string(),
            priority: new_task.priority.to_string(),
            due_date: new_task.due_date,
            parent_id: new_task.parent_id,
            tags: new_task.tags,
            is_completed: new_task.is_completed,
            recurrence_rule: new_task.recurrence_rule.map(|rule| RecurrenceRuleInput {
                frequency: rule.frequency.to_string(),
                interval: i64::from(rule.interval),
                end_date: rule.end_date,
            }),
        }
    }
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    /// Applies the creation-time bounds to the fields present in the patch
    /// and trims a present title.
    pub fn validate(mut self) -> Result<TaskPatch, ValidationError> {
        let mut errors = ValidationError::new();

        if let Some(title) = self.title.take() {
            self.title = check_title(&title, &mut errors);
        }
        if let Some(description) = &self.description {
            check_description(description.as_deref(), &mut errors);
        }
        if let Some(Some(rule)) = &self.recurrence_rule {
            check_interval(i64::from(rule.interval), &mut errors);
        }

        errors.into_result().map(|_| self)
    }
}

impl Task {
    /// Task factory: assigns a fresh identifier and the creation timestamps.
    pub fn create(new_task: NewTask, now: DateTime<Utc>) -> Task {
        Task::with_id(Uuid::new_v4().to_string(), new_task, now)
    }

    /// Same as [`Task::create`] with a caller-chosen identifier.
    pub fn with_id(id: String, new_task: NewTask, now: DateTime<Utc>) -> Task {
        Task {
            id,
            completed_at: new_task.is_completed.then_some(now),
            title: new_task.title,
            description: new_task.description,
            status: new_task.status,
            priority: new_task.priority,
            due_date: new_task.due_date,
            parent_id: new_task.parent_id,
            tags: new_task.tags,
            is_completed: new_task.is_completed,
            recurrence_rule: new_task.recurrence_rule,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks a full record: all creation constraints plus a non-empty id.
    pub fn validate(input: TaskInput) -> Result<Task, ValidationError> {
        let mut errors = ValidationError::new();
        if input.id.trim().is_empty() {
            errors.add("id", Message::IdRequired.to_string());
        }
        let fields = check_fields(input.fields, &mut errors);

        match fields {
            Some(new_task) if errors.is_empty() => Ok(Task {
                id: input.id,
                completed_at: input.completed_at,
                created_at: input.created_at,
                updated_at: input.updated_at,
                ..Task::with_id(String::new(), new_task, input.created_at)
            }),
            _ => Err(errors),
        }
    }

    // Never moves `updatedAt` backwards.
    fn touched(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.max(self.updated_at)
    }

    /// Flips the completion flag, setting or clearing `completedAt`.
    pub fn toggle_complete(&self, now: DateTime<Utc>) -> Task {
        let updated_at = self.touched(now);
        let is_completed = !self.is_completed;
        Task {
            is_completed,
            completed_at: is_completed.then_some(updated_at),
            updated_at,
            ..self.clone()
        }
    }

    /// Merges `patch` into the task and refreshes `updatedAt`.
    ///
    /// `completedAt` is left as it was even when the patch changes
    /// `isCompleted`; [`Task::apply_patch`] is the variant that keeps the two
    /// in step.
    pub fn update(&self, patch: &TaskPatch, now: DateTime<Utc>) -> Task {
        let task = self.clone();
        Task {
            title: patch.title.clone().unwrap_or(task.title),
            description: patch.description.clone().unwrap_or(task.description),
            status: patch.status.unwrap_or(task.status),
            priority: patch.priority.unwrap_or(task.priority),
            due_date: patch.due_date.unwrap_or(task.due_date),
            parent_id: patch.parent_id.clone().unwrap_or(task.parent_id),
            tags: patch.tags.clone().unwrap_or(task.tags),
            is_completed: patch.is_completed.unwrap_or(task.is_completed),
            recurrence_rule: patch.recurrence_rule.clone().unwrap_or(task.recurrence_rule),
            updated_at: self.touched(now),
            ..task
        }
    }

    /// [`Task::update`] plus completion bookkeeping: when the patch actually
    /// changes `isCompleted`, `completedAt` is set or cleared accordingly.
    pub fn apply_patch(&self, patch: &TaskPatch, now: DateTime<Utc>) -> Task {
        let merged = self.update(patch, now);
        match patch.is_completed {
            Some(flag) if flag != self.is_completed => Task {
                completed_at: flag.then_some(merged.updated_at),
                ..merged
            },
            _ => merged,
        }
    }

    pub fn is_subtask(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule.is_some()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due_date) => !self.is_completed && due_date < now,
            None => false,
        }
    }
}

/// Direct children of `parent_id`, in input order.
pub fn get_subtasks<'a>(tasks: &'a [Task], parent_id: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| task.parent_id.as_deref() == Some(parent_id))
        .collect()
}

/// Every task reachable from `parent_id` through `parentId` links.
///
/// Depth-first, each task listed before its own children, siblings in input
/// order. A task is visited at most once, so cyclic links terminate.
pub fn get_all_subtasks<'a>(tasks: &'a [Task], parent_id: &str) -> Vec<&'a Task> {
    let mut visited: HashSet<&str> = HashSet::from([parent_id]);
    let mut result = Vec::new();
    let mut stack: Vec<&Task> = get_subtasks(tasks, parent_id).into_iter().rev().collect();

    while let Some(task) = stack.pop() {
        if !visited.insert(task.id.as_str()) {
            continue;
        }
        result.push(task);
        stack.extend(get_subtasks(tasks, &task.id).into_iter().rev());
    }

    result
}

/// Creation-time guard for single-level nesting: a subtask cannot be a parent.
pub fn validate_subtask_creation(parent: &Task) -> Result<(), ValidationError> {
    if parent.is_subtask() {
        return Err(ValidationError::single(
            "parentId",
            Message::NestedSubtaskNotAllowed(parent.id.clone()).to_string(),
        ));
    }
    Ok(())
}
