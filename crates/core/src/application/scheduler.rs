//! TaskScheduler - Selection policy and the atomic claim
//!
//! - Eligible: Pending/Retrying and `scheduled_for` unset or due
//! - Order: priority desc, then `created_at` asc (oldest first)
//! - Claim: check-and-transition to Processing inside one store critical section

use crate::application::worker::constants::MAX_CLAIM_ATTEMPTS;
use crate::domain::{Task, TaskStatus};
use crate::error::{AppError, Result};
use crate::port::{TaskStore, TimeProvider};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

const CLAIMABLE: [TaskStatus; 2] = [TaskStatus::Pending, TaskStatus::Retrying];

/// TaskScheduler picks and claims the next task
pub struct TaskScheduler {
    store: Arc<dyn TaskStore>,
    time_provider: Arc<dyn TimeProvider>,
}

impl TaskScheduler {
    pub fn new(store: Arc<dyn TaskStore>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            store,
            time_provider,
        }
    }

    /// Check if a task may be claimed right now
    pub fn is_eligible(&self, task: &Task) -> bool {
        task.is_eligible(self.time_provider.now_millis())
    }

    /// Claim order: higher priority first, then oldest first
    pub fn claim_order(a: &Task, b: &Task) -> Ordering {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.created_at.cmp(&b.created_at))
    }

    /// The task the next claim would take, without claiming it
    pub async fn peek_next(&self) -> Result<Option<Task>> {
        self.next_candidate(self.time_provider.now_millis()).await
    }

    /// Claim the next eligible task (Pending/Retrying -> Processing)
    ///
    /// Returns `None` when nothing is eligible. When a concurrent caller wins
    /// the race for the selected task, a fresh snapshot is taken; a task is
    /// never handed to two callers.
    pub async fn claim_next(&self) -> Result<Option<Task>> {
        for _ in 0..MAX_CLAIM_ATTEMPTS {
            let now = self.time_provider.now_millis();
            let Some(candidate) = self.next_candidate(now).await? else {
                return Ok(None);
            };

            let claimed = self
                .store
                .modify(&candidate.id, Box::new(move |task: &mut Task| task.start(now)))
                .await;

            match claimed {
                Ok(task) => {
                    info!(
                        task_id = %task.id,
                        task_type = %task.task_type,
                        priority = %task.priority,
                        retry_count = task.retry_count,
                        "Task claimed"
                    );
                    return Ok(Some(task));
                }
                Err(AppError::Domain(e)) => {
                    debug!(task_id = %candidate.id, reason = %e, "Claim lost, re-selecting");
                }
                Err(AppError::NotFound(_)) => {
                    debug!(task_id = %candidate.id, "Candidate removed before claim, re-selecting");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            attempts = MAX_CLAIM_ATTEMPTS,
            "Claim contention, yielding until the next cycle"
        );
        Ok(None)
    }

    async fn next_candidate(&self, now: i64) -> Result<Option<Task>> {
        // Snapshot is in insertion order; the stable sort keeps it for equal keys
        let mut candidates: Vec<Task> = self
            .store
            .find_by_statuses(&CLAIMABLE)
            .await?
            .into_iter()
            .filter(|task| task.is_eligible(now))
            .collect();

        candidates.sort_by(Self::claim_order);
        Ok(candidates.into_iter().next())
    }
}
