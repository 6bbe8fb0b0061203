//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results. Task and filter
//! documents reuse the core domain types directly.

use serde::{Deserialize, Serialize};
use taskhive_core::application::UpdateTaskRequest;
use taskhive_core::domain::{Task, TaskFilter, DEFAULT_LIST_LIMIT};
use taskhive_core::config::DEFAULT_RETENTION_HOURS;

pub use taskhive_core::application::CreateTaskRequest;

/// tasks.get.v1, tasks.retry.v1, tasks.delete.v1
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskIdRequest {
    pub task_id: String,
}

/// tasks.list.v1 - Filtered page
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksRequest {
    #[serde(flatten)]
    pub filter: TaskFilter,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl Default for ListTasksRequest {
    fn default() -> Self {
        Self {
            filter: TaskFilter::default(),
            limit: default_limit(),
            offset: 0,
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_LIST_LIMIT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksResponse {
    pub tasks: Vec<Task>,
    pub count: usize,
    pub limit: usize,
    pub offset: usize,
}

/// tasks.update.v1
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskParams {
    pub task_id: String,
    #[serde(flatten)]
    pub changes: UpdateTaskRequest,
}

/// tasks.cancel.v1
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelTaskRequest {
    pub task_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTaskResponse {
    pub task_id: String,
    pub deleted: bool,
}

/// tasks.cleanup.v1 - Run cleanup now
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRequest {
    #[serde(default = "default_older_than_hours")]
    pub older_than_hours: u64,
}

impl Default for CleanupRequest {
    fn default() -> Self {
        Self {
            older_than_hours: default_older_than_hours(),
        }
    }
}

fn default_older_than_hours() -> u64 {
    DEFAULT_RETENTION_HOURS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub deleted_count: u64,
}

/// worker.restart.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartResponse {
    pub restarted: bool,
}
