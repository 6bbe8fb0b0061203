// Update Use Case

use super::create::validate_max_retries;
use crate::domain::{DomainError, Task, TaskPriority};
use crate::error::Result;
use crate::port::TaskStore;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::info;

/// Update request, every field optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    /// `Some(None)` clears the schedule (`null` on the wire)
    #[serde(
        default,
        deserialize_with = "clearable",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_for: Option<Option<i64>>,
    /// Merged key by key into the existing metadata
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

// A present field, even `null`, is an instruction
fn clearable<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Option<i64>>, D::Error> {
    Option::<i64>::deserialize(deserializer).map(Some)
}

impl UpdateTaskRequest {
    /// Names of the fields this request touches
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.priority.is_some() {
            fields.push("priority");
        }
        if self.max_retries.is_some() {
            fields.push("maxRetries");
        }
        if self.scheduled_for.is_some() {
            fields.push("scheduledFor");
        }
        if self.metadata.is_some() {
            fields.push("metadata");
        }
        fields
    }
}

fn apply(task: &mut Task, req: UpdateTaskRequest) -> crate::domain::error::Result<()> {
    task.ensure_not_processing("UPDATED")?;

    if let Some(max_retries) = req.max_retries {
        // A live task must stay within its retry budget
        if !task.status.is_terminal() && max_retries < task.retry_count {
            return Err(DomainError::ValidationError(format!(
                "maxRetries ({}) is below the current retryCount ({})",
                max_retries, task.retry_count
            )));
        }
        task.max_retries = max_retries;
    }
    if let Some(priority) = req.priority {
        task.priority = priority;
    }
    if let Some(scheduled_for) = req.scheduled_for {
        task.scheduled_for = scheduled_for;
    }
    if let Some(metadata) = req.metadata {
        task.metadata.extend(metadata);
    }
    Ok(())
}

/// Execute update use case
pub async fn execute(store: &dyn TaskStore, id: &str, req: UpdateTaskRequest) -> Result<Task> {
    if let Some(max_retries) = req.max_retries {
        validate_max_retries(max_retries)?;
    }

    let fields = req.changed_fields();
    let task = store
        .modify(id, Box::new(move |task: &mut Task| apply(task, req)))
        .await?;

    info!(task_id = %task.id, fields = ?fields, "Task updated");

    Ok(task)
}
