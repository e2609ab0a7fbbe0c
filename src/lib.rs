//! # taskman - personal task tracker
//!
//! A single-user task manager with a one-shot CLI and an interactive shell.
//! Tasks carry a title, optional description, priority, status, category,
//! due date and tags, and are stored as a JSON array in one local file.
//!
//! ## Quick Start
//!
//! ```bash
//! # Start the interactive shell
//! tm
//!
//! # Or run single commands
//! tm add Buy milk --priority high --due tomorrow --tag errand
//! tm list
//! tm complete 3f2a
//! ```
//!
//! Data lives in `~/.taskman/tasks.json` unless `--db` or `TASKMAN_DB` says
//! otherwise.
//!
//! ## Layers
//!
//! - [`task::Task`]: the entity and its field rules
//! - [`store::TaskStore`]: id-keyed map mirrored to the JSON file
//! - [`service::TaskService`]: create, update, delete and query operations
//! - [`cmd`] and [`shell`]: the command surface over the service

pub mod cli;
pub mod cmd;
pub mod config;
pub mod dates;
pub mod error;
pub mod fields;
pub mod format;
pub mod service;
pub mod shell;
pub mod store;
pub mod task;

pub use error::{Result, TaskError, ValidationError};
pub use service::{NewTask, TaskPatch, TaskService};
pub use store::TaskStore;
pub use task::Task;
