//! Error types shared by the task model, the cache and the task stores.
//!
//! Validation problems are collected per field instead of stopping at the
//! first failure, so a caller can show every message next to the input that
//! caused it. Everything that goes wrong while talking to a store ends up in
//! [`TaskError::Fetch`] unless it has a more specific meaning (missing task,
//! missing parent).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Field-keyed list of human-readable validation messages.
///
/// Serializes to the same `{field: [message, ...]}` shape used by the
/// `errors` member of an API error body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationError {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an error carrying a single message.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut error = Self::new();
        error.add(field, message);
        error
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Total number of messages across all fields.
    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    /// `Ok(())` when nothing was collected, the error itself otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Errors surfaced by the synchronization layer and the task stores.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Parent task not found: {0}")]
    ParentNotFound(String),

    /// Transport or server failure. `status` is the HTTP status when the
    /// store answered at all.
    #[error("Request failed: {message}")]
    Fetch { status: Option<u16>, message: String },
}

impl TaskError {
    pub fn fetch(status: Option<u16>, message: impl Into<String>) -> Self {
        TaskError::Fetch {
            status,
            message: message.into(),
        }
    }

    /// HTTP-style status code describing the error.
    pub fn status(&self) -> Option<u16> {
        match self {
            TaskError::Validation(_) => Some(422),
            TaskError::NotFound(_) | TaskError::ParentNotFound(_) => Some(404),
            TaskError::Fetch { status, .. } => *status,
        }
    }
}

impl From<rusqlite::Error> for TaskError {
    fn from(error: rusqlite::Error) -> Self {
        TaskError::fetch(Some(500), error.to_string())
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(error: serde_json::Error) -> Self {
        TaskError::fetch(None, error.to_string())
    }
}

impl From<reqwest::Error> for TaskError {
    fn from(error: reqwest::Error) -> Self {
        TaskError::fetch(error.status().map(|status| status.as_u16()), error.to_string())
    }
}
