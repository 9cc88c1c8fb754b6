use super::db::Db;
use crate::libs::task::{RecurrenceRule, Task, TaskPriority, TaskStatus};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result, Row};

const SCHEMA_TASKS: &str = "CREATE TABLE IF NOT EXISTS tasks (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL,
    priority TEXT NOT NULL,
    due_date TEXT,
    parent_id TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    is_completed INTEGER NOT NULL DEFAULT 0,
    completed_at TEXT,
    recurrence_rule TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);";
const INDEX_PARENT: &str = "CREATE INDEX IF NOT EXISTS idx_tasks_parent_id ON tasks(parent_id)";
const UPSERT_TASK: &str = "INSERT INTO tasks
    (id, title, description, status, priority, due_date, parent_id, tags, is_completed, completed_at, recurrence_rule, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
    ON CONFLICT(id) DO UPDATE SET
        title = excluded.title,
        description = excluded.description,
        status = excluded.status,
        priority = excluded.priority,
        due_date = excluded.due_date,
        parent_id = excluded.parent_id,
        tags = excluded.tags,
        is_completed = excluded.is_completed,
        completed_at = excluded.completed_at,
        recurrence_rule = excluded.recurrence_rule,
        updated_at = excluded.updated_at";
const SELECT_TASKS: &str = "SELECT id, title, description, status, priority, due_date, parent_id, tags, is_completed, completed_at, recurrence_rule, created_at, updated_at FROM tasks";
const ORDER_BY_SEQ: &str = "ORDER BY seq";
const WHERE_ID: &str = "WHERE id = ?1";
const DELETE_WHERE_ID_IN: &str = "DELETE FROM tasks WHERE id IN";
const COUNT_TASKS: &str = "SELECT COUNT(*) FROM tasks";

pub struct Tasks {
    pub conn: Connection,
}

// Text columns holding enums or JSON are decoded with a conversion error
// pointing at the offending column.
fn conversion_error(index: usize, error: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
}

#[derive(Debug)]
struct UnknownValue(String);

impl std::fmt::Display for UnknownValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl std::error::Error for UnknownValue {}

fn task_from_row(row: &Row) -> Result<Task> {
    let status: String = row.get(3)?;
    let priority: String = row.get(4)?;
    let tags: String = row.get(7)?;
    let recurrence_rule: Option<String> = row.get(10)?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: status.parse::<TaskStatus>().map_err(|value| conversion_error(3, UnknownValue(value)))?,
        priority: priority.parse::<TaskPriority>().map_err(|value| conversion_error(4, UnknownValue(value)))?,
        due_date: row.get::<_, Option<DateTime<Utc>>>(5)?,
        parent_id: row.get(6)?,
        tags: serde_json::from_str(&tags).map_err(|e| conversion_error(7, e))?,
        is_completed: row.get(8)?,
        completed_at: row.get(9)?,
        recurrence_rule: recurrence_rule
            .map(|json| serde_json::from_str::<RecurrenceRule>(&json))
            .transpose()
            .map_err(|e| conversion_error(10, e))?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl Tasks {
    /// Opens the task table in the application database, creating it if needed.
    pub fn new() -> anyhow::Result<Tasks> {
        Self::from_db(Db::new()?)
    }

    pub fn in_memory() -> anyhow::Result<Tasks> {
        Self::from_db(Db::in_memory()?)
    }

    fn from_db(db: Db) -> anyhow::Result<Tasks> {
        db.conn.execute(SCHEMA_TASKS, [])?;
        db.conn.execute(INDEX_PARENT, [])?;

        Ok(Tasks { conn: db.conn })
    }

    /// Inserts the task, or overwrites the row with the same id in place.
    pub fn save(&mut self, task: &Task) -> Result<()> {
        let tags = serde_json::to_string(&task.tags).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        let recurrence_rule = task
            .recurrence_rule
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        self.conn.execute(
            UPSERT_TASK,
            params![
                task.id,
                task.title,
                task.description,
                task.status.as_str(),
                task.priority.as_str(),
                task.due_date,
                task.parent_id,
                tags,
                task.is_completed,
                task.completed_at,
                recurrence_rule,
                task.created_at,
                task.updated_at
            ],
        )?;

        Ok(())
    }

    /// All tasks in insertion order.
    pub fn fetch_all(&mut self) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!("{} {}", SELECT_TASKS, ORDER_BY_SEQ))?;
        let task_iter = stmt.query_map([], task_from_row)?;

        let mut tasks = Vec::new();
        for task_result in task_iter {
            tasks.push(task_result?);
        }

        Ok(tasks)
    }

    pub fn get(&mut self, id: &str) -> Result<Option<Task>> {
        self.conn
            .query_row(&format!("{} {}", SELECT_TASKS, WHERE_ID), params![id], task_from_row)
            .optional()
    }

    /// Deletes the given ids and returns the number of removed rows.
    pub fn delete_many(&mut self, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        self.conn
            .execute(&format!("{} ({})", DELETE_WHERE_ID_IN, placeholders), params_from_iter(ids.iter()))
    }

    pub fn count(&mut self) -> Result<usize> {
        let count: usize = self.conn.query_row(COUNT_TASKS, [], |row| row.get(0))?;
        Ok(count)
    }
}
