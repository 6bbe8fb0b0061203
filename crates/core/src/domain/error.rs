// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid task state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Task {task_id} is not due until {scheduled_for}")]
    NotYetDue { task_id: String, scheduled_for: i64 },

    #[error("Unknown task type: {0}")]
    UnknownTaskType(String),

    #[error("Invalid priority: {0}")]
    InvalidPriority(i32),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl DomainError {
    pub(crate) fn transition(from: impl ToString, to: impl ToString) -> Self {
        DomainError::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
