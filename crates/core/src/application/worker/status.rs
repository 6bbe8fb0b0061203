// Worker Status

use crate::domain::TaskId;
use serde::{Deserialize, Serialize};

/// Snapshot of the worker loop, returned by `Worker::status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStatus {
    pub running: bool,
    pub current_task_id: Option<TaskId>,
    /// Tasks that settled as Completed
    pub processed_count: u64,
    /// Failed attempts, retried or not
    pub failed_count: u64,
    pub started_at: i64,
    pub last_activity: Option<i64>,
}

impl WorkerStatus {
    pub fn new(started_at: i64) -> Self {
        Self {
            running: false,
            current_task_id: None,
            processed_count: 0,
            failed_count: 0,
            started_at,
            last_activity: None,
        }
    }
}
