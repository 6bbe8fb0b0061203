// Query & Statistics Models

use serde::{Deserialize, Serialize};

use crate::domain::task::{Task, TaskPriority, TaskStatus, TaskType};

/// Default page size for listings
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Listing filter (every field optional, all given fields must match)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    #[serde(rename = "type")]
    pub task_type: Option<TaskType>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub created_by: Option<String>,
    /// Inclusive lower bound on `created_at` (epoch ms)
    pub created_after: Option<i64>,
    /// Inclusive upper bound on `created_at` (epoch ms)
    pub created_before: Option<i64>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.task_type.map_or(true, |t| task.task_type == t)
            && self.status.map_or(true, |s| task.status == s)
            && self.priority.map_or(true, |p| task.priority == p)
            && self
                .created_by
                .as_deref()
                .map_or(true, |by| task.created_by == by)
            && self.created_after.map_or(true, |after| task.created_at >= after)
            && self
                .created_before
                .map_or(true, |before| task.created_at <= before)
    }
}

/// Task counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub processing: u64,
    pub retrying: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
}

impl StatusCounts {
    pub fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Pending => self.pending += 1,
            TaskStatus::Processing => self.processing += 1,
            TaskStatus::Retrying => self.retrying += 1,
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::Failed => self.failed += 1,
            TaskStatus::Cancelled => self.cancelled += 1,
        }
    }

    pub fn get(&self, status: TaskStatus) -> u64 {
        match status {
            TaskStatus::Pending => self.pending,
            TaskStatus::Processing => self.processing,
            TaskStatus::Retrying => self.retrying,
            TaskStatus::Completed => self.completed,
            TaskStatus::Failed => self.failed,
            TaskStatus::Cancelled => self.cancelled,
        }
    }
}

/// Aggregate view over the whole store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: u64,
    pub by_status: StatusCounts,
    /// Mean of `completed_at - started_at` over Completed tasks
    pub average_duration_ms: f64,
    /// Completed / (Completed + Failed), 0 when nothing finished
    pub success_rate: f64,
}

impl TaskStats {
    /// Fold a task set into statistics
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut by_status = StatusCounts::default();
        let mut total = 0u64;
        let mut duration_sum = 0i64;
        let mut duration_samples = 0u64;

        for task in tasks {
            total += 1;
            by_status.record(task.status);
            if task.status == TaskStatus::Completed {
                if let Some(duration) = task.duration_ms() {
                    duration_sum += duration;
                    duration_samples += 1;
                }
            }
        }

        let average_duration_ms = if duration_samples > 0 {
            duration_sum as f64 / duration_samples as f64
        } else {
            0.0
        };

        let finished = by_status.completed + by_status.failed;
        let success_rate = if finished > 0 {
            by_status.completed as f64 / finished as f64
        } else {
            0.0
        };

        Self {
            total,
            by_status,
            average_duration_ms,
            success_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_at(id: &str, created_at: i64) -> Task {
        Task::new(id, TaskType::GenerateReport, json!({}), "svc-a", created_at)
    }

    #[test]
    fn test_filter_matches_all_given_fields() {
        let mut t = task_at("a", 1_000);
        t.priority = TaskPriority::High;

        let filter = TaskFilter {
            task_type: Some(TaskType::GenerateReport),
            priority: Some(TaskPriority::High),
            created_by: Some("svc-a".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&t));

        let filter = TaskFilter {
            created_by: Some("svc-b".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&t));
    }

    #[test]
    fn test_filter_time_range_is_inclusive() {
        let t = task_at("a", 1_000);
        let filter = TaskFilter {
            created_after: Some(1_000),
            created_before: Some(1_000),
            ..Default::default()
        };
        assert!(filter.matches(&t));

        let filter = TaskFilter {
            created_after: Some(1_001),
            ..Default::default()
        };
        assert!(!filter.matches(&t));
    }

    #[test]
    fn test_stats_empty_store() {
        let stats = TaskStats::from_tasks(std::iter::empty());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.average_duration_ms, 0.0);
    }

    #[test]
    fn test_stats_counts_and_rates() {
        let mut done = task_at("done", 0);
        done.start(100).unwrap();
        done.complete(json!({}), 400).unwrap();

        let mut failed = task_at("failed", 0);
        failed.max_retries = 0;
        failed.start(100).unwrap();
        failed.fail("x", 200).unwrap();

        let pending = task_at("pending", 0);

        let stats = TaskStats::from_tasks([&done, &failed, &pending]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_status.get(TaskStatus::Completed), 1);
        assert_eq!(stats.by_status.get(TaskStatus::Failed), 1);
        assert_eq!(stats.by_status.get(TaskStatus::Pending), 1);
        assert_eq!(stats.average_duration_ms, 300.0);
        assert_eq!(stats.success_rate, 0.5);
    }
}
