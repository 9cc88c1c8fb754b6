//! # Taskboard - task management with optimistic synchronization
//!
//! A task manager library and command-line client.
//!
//! ## Features
//!
//! - **Task Model**: validation, completion toggling, partial updates, subtasks
//! - **Optimistic Sync**: cache-first writes with reconciliation and rollback
//! - **Task Stores**: SQLite-backed local store or a remote REST server
//! - **CLI**: list, show, add, edit, complete and delete tasks
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskboard::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod db;
pub mod libs;
