// Simulated handlers
// Local stand-ins that sleep for a random duration and return mock documents

use crate::delay::SimulatedDelay;
use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Value};
use std::sync::Arc;
use taskhive_core::port::task_handler::require_str;
use taskhive_core::port::{HandlerError, TaskHandler, TimeProvider};

fn field(payload: &Value, name: &str) -> Value {
    payload.get(name).cloned().unwrap_or(Value::Null)
}

fn timestamp(time_provider: &dyn TimeProvider) -> Value {
    let now = time_provider.now_millis();
    chrono::DateTime::from_timestamp_millis(now)
        .map(|at| Value::String(at.to_rfc3339()))
        .unwrap_or_else(|| json!(now))
}

/// Shared state of every simulated handler
#[derive(Clone)]
pub struct Simulation {
    time_provider: Arc<dyn TimeProvider>,
    delay: SimulatedDelay,
}

impl Simulation {
    pub fn new(time_provider: Arc<dyn TimeProvider>, delay: SimulatedDelay) -> Self {
        Self {
            time_provider,
            delay,
        }
    }

    fn now(&self) -> i64 {
        self.time_provider.now_millis()
    }

    fn timestamp(&self) -> Value {
        timestamp(self.time_provider.as_ref())
    }
}

/// Grades a code submission against mock test cases
pub struct ProcessSubmissionHandler(pub Simulation);

#[async_trait]
impl TaskHandler for ProcessSubmissionHandler {
    async fn execute(&self, payload: &Value) -> Result<Value, HandlerError> {
        self.0.delay.wait().await;

        let test_results: [(u32, bool, u64, Option<&str>); 3] = [
            (1, true, 45, None),
            (2, true, 52, None),
            (3, false, 0, Some("Time limit exceeded")),
        ];
        let passed_count = test_results.iter().filter(|(_, passed, _, _)| *passed).count();
        let total_execution_time: u64 = test_results.iter().map(|(_, _, ms, _)| ms).sum();

        let cases: Vec<Value> = test_results
            .iter()
            .map(|(case, passed, ms, error)| match error {
                Some(error) => json!({"testCase": case, "passed": passed, "executionTime": ms, "error": error}),
                None => json!({"testCase": case, "passed": passed, "executionTime": ms}),
            })
            .collect();

        Ok(json!({
            "submissionId": field(payload, "submissionId"),
            "challengeId": field(payload, "challengeId"),
            "userId": field(payload, "userId"),
            "score": passed_count * 10,
            "passed": passed_count == test_results.len(),
            "testResults": cases,
            "totalExecutionTime": total_execution_time,
        }))
    }
}

/// Records a notification delivery
pub struct SendNotificationHandler(pub Simulation);

#[async_trait]
impl TaskHandler for SendNotificationHandler {
    async fn execute(&self, payload: &Value) -> Result<Value, HandlerError> {
        let user_id = require_str(payload, "userId")?;
        self.0.delay.wait().await;

        Ok(json!({
            "notificationId": format!("notif_{}", self.0.now()),
            "userId": user_id,
            "type": field(payload, "type"),
            "title": field(payload, "title"),
            "message": field(payload, "message"),
            "sentAt": self.0.timestamp(),
            "deliveryStatus": "sent",
        }))
    }
}

/// Moves a user on a leaderboard
pub struct UpdateLeaderboardHandler(pub Simulation);

#[async_trait]
impl TaskHandler for UpdateLeaderboardHandler {
    async fn execute(&self, payload: &Value) -> Result<Value, HandlerError> {
        self.0.delay.wait().await;

        let (new_rank, previous_rank) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(1..=100u32), rng.gen_range(1..=100u32))
        };

        Ok(json!({
            "userId": field(payload, "userId"),
            "challengeId": field(payload, "challengeId"),
            "score": field(payload, "score"),
            "leaderboardType": field(payload, "type"),
            "newRank": new_rank,
            "previousRank": previous_rank,
            "updatedAt": self.0.timestamp(),
        }))
    }
}

/// Produces a report descriptor
pub struct GenerateReportHandler(pub Simulation);

#[async_trait]
impl TaskHandler for GenerateReportHandler {
    async fn execute(&self, payload: &Value) -> Result<Value, HandlerError> {
        self.0.delay.wait().await;

        let report_id = format!("report_{}", self.0.now());
        let size = rand::thread_rng().gen_range(100_000..1_100_000u64);

        Ok(json!({
            "reportId": report_id,
            "reportType": field(payload, "reportType"),
            "userId": field(payload, "userId"),
            "dateRange": field(payload, "dateRange"),
            "generatedAt": self.0.timestamp(),
            "fileUrl": format!("https://reports.example.com/{}.pdf", report_id),
            "size": size,
        }))
    }
}

/// Purges application data older than `olderThanDays`
pub struct CleanupDataHandler(pub Simulation);

#[async_trait]
impl TaskHandler for CleanupDataHandler {
    async fn execute(&self, payload: &Value) -> Result<Value, HandlerError> {
        self.0.delay.wait().await;

        let deleted_count = rand::thread_rng().gen_range(10..1_010u64);

        Ok(json!({
            "dataType": field(payload, "dataType"),
            "olderThanDays": field(payload, "olderThanDays"),
            "deletedCount": deleted_count,
            "cleanedAt": self.0.timestamp(),
            "spaceSaved": format!("{:.2} MB", deleted_count as f64 * 0.5),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhive_core::port::time_provider::mocks::ManualTimeProvider;

    fn simulation() -> Simulation {
        Simulation::new(
            Arc::new(ManualTimeProvider::new(1_700_000_000_000)),
            SimulatedDelay::none(),
        )
    }

    #[tokio::test]
    async fn test_submission_scores_mock_cases() {
        let handler = ProcessSubmissionHandler(simulation());
        let result = handler
            .execute(&json!({"submissionId": "s-1", "challengeId": "c-1", "userId": "u-1"}))
            .await
            .unwrap();

        assert_eq!(result["submissionId"], "s-1");
        assert_eq!(result["score"], 20);
        assert_eq!(result["passed"], false);
        assert_eq!(result["totalExecutionTime"], 97);
        assert_eq!(result["testResults"][2]["error"], "Time limit exceeded");
    }

    #[tokio::test]
    async fn test_notification_requires_user() {
        let handler = SendNotificationHandler(simulation());
        let err = handler.execute(&json!({"title": "hi"})).await.unwrap_err();
        assert!(matches!(err, HandlerError::InvalidPayload(_)));

        let sent = handler
            .execute(&json!({"userId": "u-1", "title": "hi"}))
            .await
            .unwrap();
        assert_eq!(sent["notificationId"], "notif_1700000000000");
        assert_eq!(sent["deliveryStatus"], "sent");
    }

    #[tokio::test]
    async fn test_leaderboard_ranks_in_range() {
        let handler = UpdateLeaderboardHandler(simulation());
        let result = handler
            .execute(&json!({"userId": "u-1", "score": 90, "type": "weekly"}))
            .await
            .unwrap();

        let rank = result["newRank"].as_u64().unwrap();
        assert!((1..=100).contains(&rank));
        assert_eq!(result["leaderboardType"], "weekly");
    }

    #[tokio::test]
    async fn test_report_and_cleanup_shapes() {
        let report = GenerateReportHandler(simulation())
            .execute(&json!({"reportType": "weekly"}))
            .await
            .unwrap();
        assert_eq!(report["reportId"], "report_1700000000000");
        assert!(report["fileUrl"].as_str().unwrap().ends_with("report_1700000000000.pdf"));

        let cleanup = CleanupDataHandler(simulation())
            .execute(&json!({"dataType": "logs", "olderThanDays": 30}))
            .await
            .unwrap();
        let deleted = cleanup["deletedCount"].as_u64().unwrap();
        assert!((10..1_010).contains(&deleted));
        assert!(cleanup["spaceSaved"].as_str().unwrap().ends_with(" MB"));
    }
}
