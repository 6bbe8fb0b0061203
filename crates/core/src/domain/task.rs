// Task Domain Model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::{DomainError, Result};

/// Task ID (UUID v4)
pub type TaskId = String;

/// Retry ceiling applied when the caller does not ask for one
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Upper bound accepted for `max_retries`
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Task Type (selects the execution handler)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    GenerateChallenge,
    ProcessSubmission,
    SendNotification,
    UpdateLeaderboard,
    GenerateReport,
    CleanupData,
}

impl TaskType {
    pub const ALL: [TaskType; 6] = [
        TaskType::GenerateChallenge,
        TaskType::ProcessSubmission,
        TaskType::SendNotification,
        TaskType::UpdateLeaderboard,
        TaskType::GenerateReport,
        TaskType::CleanupData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::GenerateChallenge => "generate-challenge",
            TaskType::ProcessSubmission => "process-submission",
            TaskType::SendNotification => "send-notification",
            TaskType::UpdateLeaderboard => "update-leaderboard",
            TaskType::GenerateReport => "generate-report",
            TaskType::CleanupData => "cleanup-data",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::UnknownTaskType(s.to_string()))
    }
}

/// Task Status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Processing,
    Retrying,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Completed, Failed and Cancelled end the engine-driven lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Statuses a worker may claim from
    pub fn is_claimable(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Retrying)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "PENDING"),
            TaskStatus::Processing => write!(f, "PROCESSING"),
            TaskStatus::Retrying => write!(f, "RETRYING"),
            TaskStatus::Completed => write!(f, "COMPLETED"),
            TaskStatus::Failed => write!(f, "FAILED"),
            TaskStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Priority (selection order only, never preemption)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low = 1,
    #[default]
    Normal = 2,
    High = 3,
    Critical = 4,
}

impl TaskPriority {
    pub fn level(&self) -> i32 {
        *self as i32
    }
}

impl TryFrom<i32> for TaskPriority {
    type Error = DomainError;

    fn try_from(level: i32) -> Result<Self> {
        match level {
            1 => Ok(TaskPriority::Low),
            2 => Ok(TaskPriority::Normal),
            3 => Ok(TaskPriority::High),
            4 => Ok(TaskPriority::Critical),
            other => Err(DomainError::InvalidPriority(other)),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "low"),
            TaskPriority::Normal => write!(f, "normal"),
            TaskPriority::High => write!(f, "high"),
            TaskPriority::Critical => write!(f, "critical"),
        }
    }
}

/// Task Entity
///
/// Timestamps are epoch milliseconds taken from the injected `TimeProvider`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub priority: TaskPriority,

    pub payload: Value,
    pub result: Option<Value>,
    pub error: Option<String>,

    pub retry_count: u32,
    pub max_retries: u32,

    pub scheduled_for: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,

    pub created_by: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Task {
    /// Create a new Pending task
    ///
    /// # Arguments
    ///
    /// * `id` - Unique task ID (injected, not generated)
    /// * `task_type` - Selects the handler
    /// * `payload` - Handler-specific document
    /// * `created_by` - Attribution string
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    pub fn new(
        id: impl Into<TaskId>,
        task_type: TaskType,
        payload: Value,
        created_by: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            task_type,
            status: TaskStatus::Pending,
            priority: TaskPriority::default(),
            payload,
            result: None,
            error: None,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            scheduled_for: None,
            created_at,
            updated_at: created_at,
            started_at: None,
            completed_at: None,
            created_by: created_by.into(),
            metadata: Map::new(),
        }
    }

    /// Claimable status and due schedule
    pub fn is_eligible(&self, now_millis: i64) -> bool {
        self.status.is_claimable() && self.scheduled_for.map_or(true, |at| at <= now_millis)
    }

    /// True while another failed attempt would still lead to Retrying
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Wall-clock time of the last attempt, if it finished
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(started), Some(completed)) => Some(completed - started),
            _ => None,
        }
    }

    /// Claim: Pending/Retrying -> Processing
    pub fn start(&mut self, now_millis: i64) -> Result<()> {
        if !self.status.is_claimable() {
            return Err(DomainError::transition(self.status, TaskStatus::Processing));
        }
        if let Some(scheduled_for) = self.scheduled_for.filter(|at| *at > now_millis) {
            return Err(DomainError::NotYetDue {
                task_id: self.id.clone(),
                scheduled_for,
            });
        }
        self.status = TaskStatus::Processing;
        self.started_at = Some(now_millis);
        Ok(())
    }

    /// Processing -> Completed
    pub fn complete(&mut self, result: Value, now_millis: i64) -> Result<()> {
        self.require(TaskStatus::Processing, TaskStatus::Completed)?;
        self.status = TaskStatus::Completed;
        self.result = Some(result);
        self.completed_at = Some(now_millis);
        Ok(())
    }

    /// Processing -> Retrying, back into the eligible pool
    ///
    /// `not_before` delays eligibility (retry backoff).
    pub fn retry_later(&mut self, error: impl Into<String>, not_before: Option<i64>) -> Result<()> {
        self.require(TaskStatus::Processing, TaskStatus::Retrying)?;
        self.status = TaskStatus::Retrying;
        self.retry_count += 1;
        self.error = Some(error.into());
        self.started_at = None;
        if not_before.is_some() {
            self.scheduled_for = not_before;
        }
        Ok(())
    }

    /// Processing -> Failed (terminal)
    pub fn fail(&mut self, error: impl Into<String>, now_millis: i64) -> Result<()> {
        self.require(TaskStatus::Processing, TaskStatus::Failed)?;
        self.status = TaskStatus::Failed;
        self.retry_count += 1;
        self.error = Some(error.into());
        self.completed_at = Some(now_millis);
        Ok(())
    }

    /// Processing -> Failed, with the retry budget marked as spent
    pub fn fail_permanently(&mut self, error: impl Into<String>, now_millis: i64) -> Result<()> {
        self.fail(error, now_millis)?;
        self.retry_count = self.retry_count.max(self.max_retries);
        Ok(())
    }

    /// Pending/Retrying -> Cancelled
    pub fn cancel(&mut self, reason: impl Into<String>, now_millis: i64) -> Result<()> {
        if !self.status.is_claimable() {
            return Err(DomainError::transition(self.status, TaskStatus::Cancelled));
        }
        self.status = TaskStatus::Cancelled;
        self.error = Some(reason.into());
        self.completed_at = Some(now_millis);
        Ok(())
    }

    /// Failed -> Retrying (user-requested), retry_count is kept
    pub fn request_retry(&mut self) -> Result<()> {
        self.require(TaskStatus::Failed, TaskStatus::Retrying)?;
        if !self.can_retry() {
            return Err(DomainError::InvalidStateTransition {
                from: format!(
                    "{} (retries exhausted {}/{})",
                    self.status, self.retry_count, self.max_retries
                ),
                to: TaskStatus::Retrying.to_string(),
            });
        }
        self.status = TaskStatus::Retrying;
        self.error = None;
        self.started_at = None;
        self.completed_at = None;
        Ok(())
    }

    /// Administrative edits are refused while a worker owns the task
    pub fn ensure_not_processing(&self, action: &str) -> Result<()> {
        if self.status == TaskStatus::Processing {
            return Err(DomainError::transition(self.status, action));
        }
        Ok(())
    }

    fn require(&self, expected: TaskStatus, to: TaskStatus) -> Result<()> {
        if self.status != expected {
            return Err(DomainError::transition(self.status, to));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task() -> Task {
        Task::new(
            "task-1",
            TaskType::SendNotification,
            json!({"userId": "u-1"}),
            "svc-a",
            1_000,
        )
    }

    #[test]
    fn test_new_task_defaults() {
        let t = task();
        assert_eq!(t.status, TaskStatus::Pending);
        assert_eq!(t.priority, TaskPriority::Normal);
        assert_eq!(t.retry_count, 0);
        assert_eq!(t.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(t.updated_at, t.created_at);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(TaskPriority::Low < TaskPriority::Normal);
        assert!(TaskPriority::Normal < TaskPriority::High);
        assert!(TaskPriority::High < TaskPriority::Critical);
        assert_eq!(TaskPriority::try_from(4).unwrap(), TaskPriority::Critical);
        assert_eq!(
            TaskPriority::try_from(9),
            Err(DomainError::InvalidPriority(9))
        );
    }

    #[test]
    fn test_task_type_round_trips_through_str() {
        for t in TaskType::ALL {
            assert_eq!(t.as_str().parse::<TaskType>().unwrap(), t);
        }
        assert!("compile-kernel".parse::<TaskType>().is_err());
    }

    #[test]
    fn test_wire_format() {
        let value = serde_json::to_value(task()).unwrap();
        assert_eq!(value["type"], "send-notification");
        assert_eq!(value["status"], "PENDING");
        assert_eq!(value["priority"], "normal");
        assert_eq!(value["createdBy"], "svc-a");
        assert_eq!(value["retryCount"], 0);
    }

    #[test]
    fn test_start_respects_schedule() {
        let mut t = task();
        t.scheduled_for = Some(5_000);
        assert!(!t.is_eligible(4_999));
        assert!(matches!(t.start(4_999), Err(DomainError::NotYetDue { .. })));
        assert_eq!(t.status, TaskStatus::Pending);

        assert!(t.is_eligible(5_000));
        t.start(5_000).unwrap();
        assert_eq!(t.status, TaskStatus::Processing);
        assert_eq!(t.started_at, Some(5_000));
    }

    #[test]
    fn test_cannot_start_twice() {
        let mut t = task();
        t.start(2_000).unwrap();
        assert!(matches!(
            t.start(2_001),
            Err(DomainError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_retry_then_fail_counts_every_attempt() {
        let mut t = task();
        t.max_retries = 1;

        t.start(2_000).unwrap();
        t.retry_later("boom", None).unwrap();
        assert_eq!(t.status, TaskStatus::Retrying);
        assert_eq!(t.retry_count, 1);
        assert_eq!(t.started_at, None);

        t.start(3_000).unwrap();
        t.fail("boom again", 3_500).unwrap();
        assert_eq!(t.status, TaskStatus::Failed);
        assert_eq!(t.retry_count, 2);
        assert_eq!(t.completed_at, Some(3_500));
        assert_eq!(t.error.as_deref(), Some("boom again"));
    }

    #[test]
    fn test_retry_later_with_backoff_sets_schedule() {
        let mut t = task();
        t.start(2_000).unwrap();
        t.retry_later("boom", Some(4_000)).unwrap();
        assert_eq!(t.scheduled_for, Some(4_000));
        assert!(!t.is_eligible(3_999));
    }

    #[test]
    fn test_fail_permanently_exhausts_budget() {
        let mut t = task();
        t.start(2_000).unwrap();
        t.fail_permanently("no handler", 2_001).unwrap();
        assert_eq!(t.status, TaskStatus::Failed);
        assert_eq!(t.retry_count, t.max_retries);
        assert!(t.request_retry().is_err());
    }

    #[test]
    fn test_cancel_only_from_claimable() {
        let mut t = task();
        t.start(2_000).unwrap();
        assert!(t.cancel("nope", 2_001).is_err());

        let mut t = task();
        t.cancel("changed my mind", 2_000).unwrap();
        assert_eq!(t.status, TaskStatus::Cancelled);
        assert_eq!(t.completed_at, Some(2_000));
        assert!(t.cancel("again", 2_001).is_err());
    }

    #[test]
    fn test_request_retry_clears_attempt_fields() {
        let mut t = task();
        t.max_retries = 0;
        t.start(2_000).unwrap();
        t.fail("boom", 2_500).unwrap();
        assert!(t.request_retry().is_err(), "ceiling reached");

        t.max_retries = 3;
        t.request_retry().unwrap();
        assert_eq!(t.status, TaskStatus::Retrying);
        assert_eq!(t.retry_count, 1);
        assert_eq!(t.error, None);
        assert_eq!(t.started_at, None);
        assert_eq!(t.completed_at, None);
    }

    #[test]
    fn test_complete_only_from_processing() {
        let mut t = task();
        assert!(t.complete(json!({}), 2_000).is_err());
        t.start(2_000).unwrap();
        t.complete(json!({"delivered": true}), 2_250).unwrap();
        assert_eq!(t.duration_ms(), Some(250));
        assert_eq!(t.result, Some(json!({"delivered": true})));
    }
}
