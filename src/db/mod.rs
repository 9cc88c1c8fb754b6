//! Database layer backing the local task store.
//!
//! A single SQLite file in the application data directory holds every task
//! the local store knows about. Rows keep their insertion order, which is the
//! order the store reports tasks in.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use taskboard::db::tasks::Tasks;
//! use taskboard::libs::task::{NewTask, Task, TaskPriority, TaskStatus};
//!
//! let mut tasks = Tasks::new()?;
//! let task = Task::create(
//!     NewTask {
//!         title: "Review code".to_string(),
//!         description: None,
//!         status: TaskStatus::Todo,
//!         priority: TaskPriority::High,
//!         due_date: None,
//!         parent_id: None,
//!         tags: vec!["review".to_string()],
//!         is_completed: false,
//!         recurrence_rule: None,
//!     },
//!     Utc::now(),
//! );
//! tasks.save(&task)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Connection management.
pub mod db;

/// Task rows: upsert, lookup, ordered listing and bulk delete.
pub mod tasks;
