//! Error types for task management.

use std::path::PathBuf;

use thiserror::Error;

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 100;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Highest allowed progress percentage.
pub const MAX_PROGRESS: u8 = 100;

/// Rejected input: a blank identifier or a field outside its allowed range.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The task id is empty or whitespace.
    #[error("task id cannot be empty")]
    EmptyId,

    /// The title is longer than [`MAX_TITLE_LEN`].
    #[error("title cannot exceed {max} characters (got {length})")]
    TitleTooLong { length: usize, max: usize },

    /// The description is longer than [`MAX_DESCRIPTION_LEN`].
    #[error("description cannot exceed {max} characters (got {length})")]
    DescriptionTooLong { length: usize, max: usize },

    #[error("progress must be between 0 and {max} (got {value})")]
    ProgressOutOfRange { value: u8, max: u8 },

    #[error("estimated hours cannot be negative (got {value})")]
    NegativeEstimate { value: i32 },
}

/// Errors returned by the store and the service.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No task has the given id.
    #[error("task with id '{0}' not found")]
    NotFound(String),

    /// Writing the backing file failed.
    #[error("failed to save tasks to {}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TaskError {
    pub fn is_validation(&self) -> bool {
        matches!(self, TaskError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskError::NotFound(_))
    }
}

/// Result alias for store and service operations.
pub type Result<T> = std::result::Result<T, TaskError>;
