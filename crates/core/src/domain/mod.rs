// Domain Layer - Pure business logic and entities

pub mod error;
pub mod query;
pub mod task;

// Re-exports
pub use error::DomainError;
pub use query::{StatusCounts, TaskFilter, TaskStats, DEFAULT_LIST_LIMIT};
pub use task::{
    Task, TaskId, TaskPriority, TaskStatus, TaskType, DEFAULT_MAX_RETRIES, MAX_RETRIES_LIMIT,
};
