// Task Service - Public lifecycle API and outcome recording

pub mod create;
pub mod update;

#[cfg(test)]
mod create_test;

pub use create::CreateTaskRequest;
pub use update::UpdateTaskRequest;

use crate::application::retry::{RetryDecision, RetryPolicy};
use crate::domain::{Task, TaskFilter, TaskStats, TaskStatus};
use crate::error::{AppError, Result};
use crate::port::time_provider::MILLIS_PER_HOUR;
use crate::port::{IdProvider, TaskStore, TimeProvider};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Reason recorded when `cancel` is called without one
pub const DEFAULT_CANCEL_REASON: &str = "Task cancelled by user";

/// Task Service
///
/// Every state change goes through `TaskStore::modify`, so the legality
/// check and the write happen in one critical section.
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    retry_policy: RetryPolicy,
}

impl TaskService {
    pub fn new(
        store: Arc<dyn TaskStore>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            id_provider,
            time_provider,
            retry_policy,
        }
    }

    /// Create a new Pending task
    pub async fn create(&self, req: CreateTaskRequest) -> Result<Task> {
        create::execute(
            self.store.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            req,
        )
        .await
    }

    pub async fn get(&self, id: &str) -> Result<Task> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::task_not_found(id))
    }

    /// Filtered page, newest first
    pub async fn list(&self, filter: &TaskFilter, limit: usize, offset: usize) -> Result<Vec<Task>> {
        self.store.list(filter, limit, offset).await
    }

    /// Edit priority, retry budget, schedule or metadata of a task
    pub async fn update(&self, id: &str, req: UpdateTaskRequest) -> Result<Task> {
        update::execute(self.store.as_ref(), id, req).await
    }

    /// Pending/Retrying -> Cancelled
    pub async fn cancel(&self, id: &str, reason: Option<String>) -> Result<Task> {
        let now = self.time_provider.now_millis();
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());

        let task = self
            .store
            .modify(id, Box::new(move |task: &mut Task| task.cancel(reason, now)))
            .await?;

        info!(task_id = %task.id, reason = ?task.error, "Task cancelled");
        Ok(task)
    }

    /// Remove a task that is not Processing
    pub async fn delete(&self, id: &str) -> Result<()> {
        let removed = self
            .store
            .delete_unless(id, &[TaskStatus::Processing])
            .await?;

        info!(task_id = %removed.id, status = %removed.status, "Task deleted");
        Ok(())
    }

    /// Failed -> Retrying on user request
    pub async fn request_retry(&self, id: &str) -> Result<Task> {
        let task = self
            .store
            .modify(id, Box::new(|task: &mut Task| task.request_retry()))
            .await?;

        info!(
            task_id = %task.id,
            retry_count = task.retry_count,
            max_retries = task.max_retries,
            "Task retry requested"
        );
        Ok(task)
    }

    /// Processing -> Completed
    pub async fn record_success(&self, id: &str, result: Value, duration_ms: u64) -> Result<Task> {
        let now = self.time_provider.now_millis();
        let task = self
            .store
            .modify(id, Box::new(move |task: &mut Task| task.complete(result, now)))
            .await?;

        info!(
            task_id = %task.id,
            task_type = %task.task_type,
            duration_ms = duration_ms,
            retry_count = task.retry_count,
            "Task completed"
        );
        Ok(task)
    }

    /// Processing -> Retrying or Failed, per retry policy
    pub async fn record_failure(
        &self,
        id: &str,
        error: &str,
        duration_ms: Option<u64>,
    ) -> Result<Task> {
        let now = self.time_provider.now_millis();
        let policy = self.retry_policy;
        let message = error.to_string();

        let task = self
            .store
            .modify(
                id,
                Box::new(move |task: &mut Task| {
                    policy.apply(task, message, now).map(|_: RetryDecision| ())
                }),
            )
            .await?;

        self.log_failure(&task, duration_ms);
        Ok(task)
    }

    /// Processing -> Failed with the retry budget spent
    ///
    /// For failures a retry cannot fix, such as a task type without handler.
    pub async fn record_permanent_failure(
        &self,
        id: &str,
        error: &str,
        duration_ms: Option<u64>,
    ) -> Result<Task> {
        let now = self.time_provider.now_millis();
        let message = error.to_string();

        let task = self
            .store
            .modify(
                id,
                Box::new(move |task: &mut Task| task.fail_permanently(message, now)),
            )
            .await?;

        self.log_failure(&task, duration_ms);
        Ok(task)
    }

    /// Delete finished tasks not touched for `older_than_hours`
    ///
    /// # Returns
    /// Number of tasks deleted
    pub async fn cleanup(&self, older_than_hours: u64) -> Result<u64> {
        let hours = i64::try_from(older_than_hours)
            .map_err(|_| AppError::Validation(format!("olderThanHours out of range: {}", older_than_hours)))?;
        let cutoff = self
            .time_provider
            .now_millis()
            .saturating_sub(hours.saturating_mul(MILLIS_PER_HOUR));

        let deleted = self.store.delete_finished_before(cutoff).await?;
        if deleted > 0 {
            info!(deleted = deleted, older_than_hours = older_than_hours, "Cleaned up old tasks");
        }
        Ok(deleted)
    }

    pub async fn statistics(&self) -> Result<TaskStats> {
        self.store.statistics().await
    }

    pub async fn queue_size(&self) -> Result<usize> {
        self.store.len().await
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    fn log_failure(&self, task: &Task, duration_ms: Option<u64>) {
        match task.status {
            TaskStatus::Retrying => warn!(
                task_id = %task.id,
                task_type = %task.task_type,
                retry_count = task.retry_count,
                max_retries = task.max_retries,
                duration_ms = ?duration_ms,
                error = ?task.error,
                "Task failed, will retry"
            ),
            _ => error!(
                task_id = %task.id,
                task_type = %task.task_type,
                retry_count = task.retry_count,
                duration_ms = ?duration_ms,
                error = ?task.error,
                "Task failed permanently"
            ),
        }
    }
}
