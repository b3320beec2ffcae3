use thiserror::Error;

use crate::domain::task::TaskStatus;

/// Errors that can occur in the coordination engine
#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("lock conflict: {0}")]
    LockConflict(String),

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type CoordinationResult<T> = Result<T, CoordinationError>;
