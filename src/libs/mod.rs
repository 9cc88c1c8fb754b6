//! Core library modules for taskboard.
//!
//! - **[`task`]**: task entity, validation and pure transforms
//! - **[`cache`]**: in-memory task cache with optimistic mutation bookkeeping
//! - **[`sync`]**: synchronization layer between callers, cache and task store
//! - **[`error`]**: validation and task errors
//! - **[`config`]**, **[`data_storage`]**: configuration file and data directory
//! - **[`messages`]**, **[`view`]**: console output
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskboard::api::LocalTaskStore;
//! use taskboard::libs::sync::TaskSync;
//!
//! # async fn run() -> Result<(), taskboard::libs::error::TaskError> {
//! let sync = TaskSync::new(LocalTaskStore::open()?);
//! let tasks = sync.tasks().await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod data_storage;
pub mod error;
pub mod messages;
pub mod sync;
pub mod task;
pub mod view;
