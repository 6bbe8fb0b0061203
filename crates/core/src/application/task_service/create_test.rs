//! Unit tests for create/update validation

use super::create::{validate_max_retries, validate_request, CreateTaskRequest};
use super::update::UpdateTaskRequest;
use crate::domain::{TaskPriority, TaskType};
use serde_json::json;

fn request() -> CreateTaskRequest {
    CreateTaskRequest::new(TaskType::SendNotification, json!({"userId": "u-1"}), "svc-a")
}

#[test]
fn test_validate_accepts_minimal_request() {
    assert!(validate_request(&request()).is_ok());
}

#[test]
fn test_validate_created_by_empty() {
    let mut req = request();
    req.created_by = "   ".to_string();

    let result = validate_request(&req);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("createdBy"));
}

#[test]
fn test_validate_payload_must_be_object() {
    let mut req = request();
    req.payload = json!([1, 2, 3]);

    let result = validate_request(&req);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("payload"));
}

#[test]
fn test_validate_max_retries_range() {
    assert!(validate_max_retries(0).is_ok());
    assert!(validate_max_retries(10).is_ok());

    let result = validate_request(&request().with_max_retries(11));
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("maxRetries"));
}

#[test]
fn test_create_request_wire_format() {
    let req: CreateTaskRequest = serde_json::from_value(json!({
        "type": "generate-report",
        "payload": {"reportType": "weekly"},
        "createdBy": "admin",
        "priority": "high",
        "maxRetries": 5,
        "metadata": {"source": "cron"}
    }))
    .unwrap();

    assert_eq!(req.task_type, TaskType::GenerateReport);
    assert_eq!(req.priority, Some(TaskPriority::High));
    assert_eq!(req.max_retries, Some(5));
    assert_eq!(req.scheduled_for, None);
    assert_eq!(req.metadata.unwrap()["source"], "cron");
}

#[test]
fn test_create_request_rejects_non_object_metadata() {
    let result = serde_json::from_value::<CreateTaskRequest>(json!({
        "type": "generate-report",
        "payload": {},
        "createdBy": "admin",
        "metadata": "nope"
    }));
    assert!(result.is_err());
}

#[test]
fn test_update_changed_fields() {
    let req = UpdateTaskRequest {
        priority: Some(TaskPriority::Critical),
        metadata: Some(serde_json::Map::new()),
        ..Default::default()
    };
    assert_eq!(req.changed_fields(), vec!["priority", "metadata"]);
    assert!(UpdateTaskRequest::default().changed_fields().is_empty());
}

#[test]
fn test_update_scheduled_for_null_clears() {
    let cleared: UpdateTaskRequest = serde_json::from_value(json!({"scheduledFor": null})).unwrap();
    assert_eq!(cleared.scheduled_for, Some(None));
    assert_eq!(cleared.changed_fields(), vec!["scheduledFor"]);

    let set: UpdateTaskRequest = serde_json::from_value(json!({"scheduledFor": 1_000})).unwrap();
    assert_eq!(set.scheduled_for, Some(Some(1_000)));

    let absent: UpdateTaskRequest = serde_json::from_value(json!({"priority": "low"})).unwrap();
    assert_eq!(absent.scheduled_for, None);
    assert_eq!(absent.changed_fields(), vec!["priority"]);
}
