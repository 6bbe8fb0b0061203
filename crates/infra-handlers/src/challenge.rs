// Challenge generation handler
// Delegates to the content backend over HTTP

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use taskhive_core::error::{AppError, Result};
use taskhive_core::port::{HandlerError, TaskHandler};
use tracing::debug;

/// Backend request deadline (30s)
pub const BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

const GENERATE_PATH: &str = "/api/challenges/generate";

/// Response body of the generate endpoint
#[derive(Debug, Deserialize)]
struct GeneratedChallenge {
    id: Value,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    difficulty: Option<Value>,
    #[serde(default)]
    category: Option<Value>,
}

/// Posts `{difficulty, category, requestedBy}` to the backend
pub struct GenerateChallengeHandler {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GenerateChallengeHandler {
    /// # Arguments
    /// * `backend_url` - Base URL of the content backend
    /// * `api_key` - Sent as `X-API-Key` when set
    pub fn new(backend_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(BACKEND_TIMEOUT)
            .build()
            .map_err(|e| AppError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint(backend_url),
            api_key,
        })
    }
}

fn endpoint(backend_url: &str) -> String {
    format!("{}{}", backend_url.trim_end_matches('/'), GENERATE_PATH)
}

fn upstream(e: reqwest::Error) -> HandlerError {
    if e.is_timeout() {
        return HandlerError::Timeout(BACKEND_TIMEOUT.as_millis() as u64);
    }
    HandlerError::Upstream(e.to_string())
}

#[async_trait]
impl TaskHandler for GenerateChallengeHandler {
    async fn execute(&self, payload: &Value) -> std::result::Result<Value, HandlerError> {
        let body = json!({
            "difficulty": payload.get("difficulty"),
            "category": payload.get("category"),
            "requestedBy": payload.get("userId"),
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key);
        }

        debug!(endpoint = %self.endpoint, "Requesting challenge generation");
        let response = request
            .send()
            .await
            .map_err(upstream)?
            .error_for_status()
            .map_err(upstream)?;
        let challenge: GeneratedChallenge = response.json().await.map_err(upstream)?;

        Ok(json!({
            "challengeId": challenge.id,
            "title": challenge.title,
            "description": challenge.description,
            "difficulty": challenge.difficulty,
            "category": challenge.category,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_path() {
        assert_eq!(
            endpoint("http://backend:3000/"),
            "http://backend:3000/api/challenges/generate"
        );
        assert_eq!(
            endpoint("http://backend:3000"),
            "http://backend:3000/api/challenges/generate"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_upstream_error() {
        // Port 1 on loopback refuses connections
        let handler = GenerateChallengeHandler::new("http://127.0.0.1:1", None).unwrap();
        let err = handler
            .execute(&json!({"difficulty": "easy", "category": "arrays", "userId": "u-1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Upstream(_)), "got {:?}", err);
    }
}
