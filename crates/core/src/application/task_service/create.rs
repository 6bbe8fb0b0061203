// Create Use Case

use crate::domain::{Task, TaskPriority, TaskType, DEFAULT_MAX_RETRIES, MAX_RETRIES_LIMIT};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, TaskStore, TimeProvider};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

/// Create request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub payload: Value,
    pub created_by: String,

    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub scheduled_for: Option<i64>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl CreateTaskRequest {
    pub fn new(task_type: TaskType, payload: Value, created_by: impl Into<String>) -> Self {
        Self {
            task_type,
            payload,
            created_by: created_by.into(),
            priority: None,
            max_retries: None,
            scheduled_for: None,
            metadata: None,
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn scheduled_for(mut self, at_millis: i64) -> Self {
        self.scheduled_for = Some(at_millis);
        self
    }
}

/// Validate a create request
pub(crate) fn validate_request(req: &CreateTaskRequest) -> Result<()> {
    if req.created_by.trim().is_empty() {
        return Err(AppError::Validation("createdBy cannot be empty".to_string()));
    }

    if !req.payload.is_object() {
        return Err(AppError::Validation(
            "payload must be a JSON object".to_string(),
        ));
    }

    if let Some(max_retries) = req.max_retries {
        validate_max_retries(max_retries)?;
    }

    Ok(())
}

pub(crate) fn validate_max_retries(max_retries: u32) -> Result<()> {
    if max_retries > MAX_RETRIES_LIMIT {
        return Err(AppError::Validation(format!(
            "maxRetries must be between 0 and {} (got {})",
            MAX_RETRIES_LIMIT, max_retries
        )));
    }
    Ok(())
}

/// Execute create use case
///
/// # Arguments
///
/// * `store` - Task store (enforces capacity)
/// * `id_provider` - ID generator (injected for determinism)
/// * `time_provider` - Time provider (injected for determinism)
/// * `req` - Create request
pub async fn execute(
    store: &dyn TaskStore,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    req: CreateTaskRequest,
) -> Result<Task> {
    validate_request(&req)?;

    let mut task = Task::new(
        id_provider.generate_id(),
        req.task_type,
        req.payload,
        req.created_by,
        time_provider.now_millis(),
    );
    task.priority = req.priority.unwrap_or_default();
    task.max_retries = req.max_retries.unwrap_or(DEFAULT_MAX_RETRIES);
    task.scheduled_for = req.scheduled_for;
    task.metadata = req.metadata.unwrap_or_default();

    store.insert(&task).await?;

    info!(
        task_id = %task.id,
        task_type = %task.task_type,
        priority = %task.priority,
        created_by = %task.created_by,
        scheduled_for = ?task.scheduled_for,
        "Task created"
    );

    Ok(task)
}
