// Central Error Type for the Application

use thiserror::Error;

use crate::domain::{DomainError, TaskType};
use crate::port::HandlerError;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Queue is full. Maximum size: {max}")]
    CapacityExceeded { max: usize },

    #[error("No handler registered for task type: {0}")]
    UnregisteredHandler(TaskType),

    #[error("Handler execution error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn task_not_found(id: &str) -> Self {
        AppError::NotFound(format!("Task {} not found", id))
    }

    /// Operation forbidden given the task's current status
    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            AppError::Domain(DomainError::InvalidStateTransition { .. })
        )
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
