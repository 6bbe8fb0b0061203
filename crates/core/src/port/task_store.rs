// Task Store Port (Interface)

use crate::domain::error::Result as DomainResult;
use crate::domain::{Task, TaskFilter, TaskStats, TaskStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Read-modify-write step applied atomically by [`TaskStore::modify`]
pub type TaskMutation = Box<dyn FnOnce(&mut Task) -> DomainResult<()> + Send>;

/// Storage interface, the sole owner of every Task value
///
/// Callers always receive copies. Every mutating method is serialized
/// against all others by the implementation.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new task
    ///
    /// # Errors
    /// - `AppError::CapacityExceeded` when the store already holds `capacity()` tasks
    /// - `AppError::Conflict` when the id is already present
    async fn insert(&self, task: &Task) -> Result<()>;

    /// Find task by ID (`None` when absent)
    async fn find_by_id(&self, id: &str) -> Result<Option<Task>>;

    /// Apply `mutation` to the stored task in one critical section
    ///
    /// The mutation runs on a copy; the copy is committed with a fresh
    /// `updated_at` only if the mutation returns `Ok`.
    ///
    /// # Errors
    /// - `AppError::NotFound` for an unknown id
    /// - `AppError::Domain` with the mutation's error, store unchanged
    async fn modify(&self, id: &str, mutation: TaskMutation) -> Result<Task>;

    /// Remove a task, returning whether it existed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Remove a task unless its status is one of `forbidden`
    ///
    /// Returns the removed task.
    async fn delete_unless(&self, id: &str, forbidden: &[TaskStatus]) -> Result<Task>;

    /// Filtered page, newest first by `created_at`
    async fn list(&self, filter: &TaskFilter, limit: usize, offset: usize) -> Result<Vec<Task>>;

    /// All tasks in one of `statuses`, oldest insertion first
    async fn find_by_statuses(&self, statuses: &[TaskStatus]) -> Result<Vec<Task>>;

    /// Counts, mean duration and success rate over the whole store
    async fn statistics(&self) -> Result<TaskStats>;

    /// Delete terminal tasks with `updated_at < cutoff_millis`
    ///
    /// # Returns
    /// Number of tasks deleted
    async fn delete_finished_before(&self, cutoff_millis: i64) -> Result<u64>;

    /// Current number of stored tasks
    async fn len(&self) -> Result<usize>;

    /// Configured maximum number of tasks
    fn capacity(&self) -> usize;
}
