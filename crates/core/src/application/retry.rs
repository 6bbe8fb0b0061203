// Retry logic
use crate::config::RetryConfig;
use crate::domain::error::Result as DomainResult;
use crate::domain::Task;
use tracing::{info, warn};

/// Ceiling for a single backoff delay (1 hour)
pub const MAX_BACKOFF_MS: i64 = 60 * 60 * 1000;

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Back to Retrying, eligible again after `delay_ms` (0 = immediately)
    Retry(i64),
    /// Retry ceiling reached, task fails permanently
    Failed,
}

/// Retry policy
///
/// Determines what a failed attempt turns into based on:
/// - Current retry count (before this failure)
/// - Maximum retries allowed
/// - Optional exponential backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    base_delay_ms: i64,
    backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            base_delay_ms: config.base_delay_ms.max(0),
            backoff_factor: config.backoff_factor,
        }
    }

    /// Decide the outcome of a failed attempt
    ///
    /// Increment-then-check convention: a task whose count is still below
    /// `max_retries` goes back to Retrying, otherwise it fails. Either way
    /// the caller increments `retry_count` by one.
    ///
    /// Backoff formula:
    /// delay = base_delay * (backoff_factor ^ retry_count) * (1.0 ± 0.1),
    /// capped at `MAX_BACKOFF_MS`
    pub fn should_retry(&self, task: &Task) -> RetryDecision {
        if !task.can_retry() {
            warn!(
                task_id = %task.id,
                retry_count = task.retry_count,
                max_retries = task.max_retries,
                "Max retry attempts reached"
            );
            return RetryDecision::Failed;
        }

        if self.base_delay_ms == 0 {
            return RetryDecision::Retry(0);
        }

        let base_delay_ms = self.base_delay_ms as f64 * self.backoff_factor.powi(task.retry_count as i32);

        // ±10% jitter, seeded by task id so the delay is deterministic per task
        let jitter_seed = task.id.chars().map(|c| c as u32).sum::<u32>();
        let jitter_factor = 0.9 + ((jitter_seed % 21) as f64 / 100.0);

        let delay_ms = (base_delay_ms * jitter_factor).min(MAX_BACKOFF_MS as f64) as i64;

        info!(
            task_id = %task.id,
            retry_count = task.retry_count,
            delay_ms = delay_ms,
            "Scheduling retry"
        );

        RetryDecision::Retry(delay_ms)
    }

    /// Apply the decision to a Processing task
    pub fn apply(
        &self,
        task: &mut Task,
        error: impl Into<String>,
        now_millis: i64,
    ) -> DomainResult<RetryDecision> {
        let decision = self.should_retry(task);
        match decision {
            RetryDecision::Retry(delay_ms) => {
                let not_before = (delay_ms > 0).then(|| now_millis.saturating_add(delay_ms));
                task.retry_later(error, not_before)?;
            }
            RetryDecision::Failed => task.fail(error, now_millis)?,
        }
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskStatus, TaskType};
    use serde_json::json;

    fn processing_task(max_retries: u32) -> Task {
        let mut task = Task::new(
            "task-7",
            TaskType::ProcessSubmission,
            json!({}),
            "svc-a",
            0,
        );
        task.max_retries = max_retries;
        task.start(10).unwrap();
        task
    }

    #[test]
    fn test_immediate_retry_by_default() {
        let policy = RetryPolicy::default();
        let task = processing_task(3);
        assert_eq!(policy.should_retry(&task), RetryDecision::Retry(0));
    }

    #[test]
    fn test_zero_max_retries_fails_first_time() {
        let policy = RetryPolicy::default();
        let mut task = processing_task(0);
        let decision = policy.apply(&mut task, "boom", 20).unwrap();
        assert_eq!(decision, RetryDecision::Failed);
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.retry_count, 1);
    }

    #[test]
    fn test_backoff_grows_with_retry_count() {
        let policy = RetryPolicy::new(&RetryConfig {
            base_delay_ms: 1000,
            backoff_factor: 2.0,
        });
        let mut task = processing_task(5);

        let RetryDecision::Retry(first) = policy.should_retry(&task) else {
            panic!("expected retry");
        };
        task.retry_count = 2;
        let RetryDecision::Retry(third) = policy.should_retry(&task) else {
            panic!("expected retry");
        };

        assert!((900..=1100).contains(&first), "first delay {}", first);
        assert!((3600..=4400).contains(&third), "third delay {}", third);
    }

    #[test]
    fn test_apply_with_backoff_reschedules() {
        let policy = RetryPolicy::new(&RetryConfig {
            base_delay_ms: 1000,
            backoff_factor: 2.0,
        });
        let mut task = processing_task(3);
        let decision = policy.apply(&mut task, "boom", 50).unwrap();

        let RetryDecision::Retry(delay) = decision else {
            panic!("expected retry");
        };
        assert_eq!(task.status, TaskStatus::Retrying);
        assert_eq!(task.scheduled_for, Some(50 + delay));
    }

    #[test]
    fn test_backoff_capped_for_extreme_factor() {
        let policy = RetryPolicy::new(&RetryConfig {
            base_delay_ms: 1000,
            backoff_factor: 100.0,
        });
        let mut task = processing_task(10);
        task.retry_count = 9;

        let now = 1_700_000_000_000;
        let decision = policy.apply(&mut task, "boom", now).unwrap();

        assert_eq!(decision, RetryDecision::Retry(MAX_BACKOFF_MS));
        assert_eq!(task.status, TaskStatus::Retrying);
        assert_eq!(task.retry_count, 10);
        assert_eq!(task.scheduled_for, Some(now + MAX_BACKOFF_MS));
    }

    #[test]
    fn test_infinite_growth_stays_capped() {
        let policy = RetryPolicy::new(&RetryConfig {
            base_delay_ms: i64::MAX,
            backoff_factor: f64::MAX,
        });
        let mut task = processing_task(10);
        task.retry_count = 9;

        assert_eq!(policy.should_retry(&task), RetryDecision::Retry(MAX_BACKOFF_MS));
        policy.apply(&mut task, "boom", i64::MAX - 1).unwrap();
        assert_eq!(task.scheduled_for, Some(i64::MAX));
    }
}
