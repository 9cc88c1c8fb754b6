//! Text for every [`Message`] variant.
//!
//! Keeping all wording in one match makes it easy to review tone and to spot
//! a message that is missing a parameter.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === TASK MESSAGES ===
            Message::TaskCreated(title) => format!("Task '{}' created", title),
            Message::TaskUpdated(title) => format!("Task '{}' updated", title),
            Message::TaskCompleted(title) => format!("Task '{}' marked as done", title),
            Message::TaskReopened(title) => format!("Task '{}' reopened", title),
            Message::TaskDeleted(id) => format!("Task {} deleted", id),
            Message::TasksHeader => "Tasks:".to_string(),
            Message::NoTasksFound => "No tasks found.".to_string(),
            Message::TaskDetailHeader(title) => format!("Task: {}", title),
            Message::SubtasksHeader => "Subtasks:".to_string(),
            Message::ParentTaskHeader => "Parent task:".to_string(),
            Message::ConfirmDeleteTask(title, 0) => format!("Delete task '{}'?", title),
            Message::ConfirmDeleteTask(title, count) => {
                format!("Delete task '{}' and its {} subtask(s)?", title, count)
            }
            Message::NoChangesProvided => "Nothing to change: pass at least one field to update.".to_string(),
            Message::OperationCancelled => "Operation cancelled.".to_string(),
            Message::TaskCreateFailed(error) => format!("Failed to create task: {}", error),
            Message::TaskUpdateFailed(error) => format!("Failed to update task: {}", error),
            Message::TaskDeleteFailed(error) => format!("Failed to delete task: {}", error),
            Message::TasksFetchFailed(error) => format!("Failed to fetch tasks: {}", error),

            // === VALIDATION MESSAGES ===
            Message::TitleRequired => "Title is required".to_string(),
            Message::TitleTooLong(max) => format!("Title must be at most {} characters", max),
            Message::DescriptionTooLong(max) => format!("Description must be at most {} characters", max),
            Message::InvalidStatus(value) => {
                format!("Unknown status '{}': expected todo, in_progress or done", value)
            }
            Message::InvalidPriority(value) => {
                format!("Unknown priority '{}': expected low, medium or high", value)
            }
            Message::InvalidFrequency(value) => {
                format!("Unknown recurrence frequency '{}': expected daily, weekly or monthly", value)
            }
            Message::InvalidInterval(value) => format!("Recurrence interval must be at least 1, got {}", value),
            Message::InvalidDate(value) => {
                format!("Invalid date '{}': use YYYY-MM-DD or an RFC 3339 timestamp", value)
            }
            Message::IdRequired => "Task id is required".to_string(),
            Message::NestedSubtaskNotAllowed(parent) => {
                format!("Task {} is already a subtask and cannot have subtasks", parent)
            }

            // === STORE MESSAGES ===
            Message::InternalServerError => "Internal Server Error".to_string(),
            Message::StoreSeeded(count) => format!("Added {} sample task(s)", count),
            Message::StoreAlreadySeeded => "The store already contains tasks, nothing seeded.".to_string(),
            Message::UsingServer(url) => format!("Using task server at {}", url),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved".to_string(),
            Message::ConfigDeleted => "Configuration removed, using defaults".to_string(),
            Message::ConfigModuleServer => "Server".to_string(),
            Message::ConfigModuleStore => "Local store".to_string(),
            Message::PromptSelectModules => "Select modules to configure".to_string(),
            Message::PromptServerApiUrl => "Task server URL (empty to use the local store)".to_string(),
            Message::PromptServerAuthToken => "Auth token (optional)".to_string(),
            Message::PromptStoreLatency => "Simulated latency in milliseconds".to_string(),
            Message::PromptStoreSeed => "Seed sample tasks into an empty store?".to_string(),
        };
        write!(f, "{}", text)
    }
}
