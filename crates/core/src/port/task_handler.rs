// Task Handler Port
// Per-type business logic invoked by the worker

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Handler errors (every variant is a failed attempt for the retry policy)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("{0}")]
    Failed(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Handler timed out after {0}ms")]
    Timeout(u64),

    #[error("Handler panicked: {0}")]
    Panicked(String),
}

/// Task Handler trait
///
/// Receives the task's payload and returns an opaque result document.
/// Handlers must not retry on their own; the retry policy lives in
/// `TaskService`.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Execute one attempt
    ///
    /// # Errors
    /// - HandlerError::InvalidPayload if the payload misses required fields
    /// - HandlerError::Upstream if a remote collaborator failed
    async fn execute(&self, payload: &Value) -> Result<Value, HandlerError>;
}

/// Read a required string field from a payload object
pub fn require_str<'a>(payload: &'a Value, field: &str) -> Result<&'a str, HandlerError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| HandlerError::InvalidPayload(format!("missing string field '{}'", field)))
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Mock handler behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Succeed with this result
        Succeed(Value),
        /// Fail with message
        Fail(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
        /// Sleep before succeeding (for timeout testing)
        Hang(Duration),
    }

    /// Handler that replays a script, then repeats a fallback behavior
    pub struct ScriptedHandler {
        script: Mutex<VecDeque<MockBehavior>>,
        fallback: MockBehavior,
        call_count: AtomicUsize,
    }

    impl ScriptedHandler {
        pub fn new(script: Vec<MockBehavior>, fallback: MockBehavior) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback,
                call_count: AtomicUsize::new(0),
            }
        }

        pub fn always_succeed(result: Value) -> Self {
            Self::new(Vec::new(), MockBehavior::Succeed(result))
        }

        pub fn always_fail(message: impl Into<String>) -> Self {
            Self::new(Vec::new(), MockBehavior::Fail(message.into()))
        }

        /// Fail `times` times, then succeed with `result`
        pub fn fail_then_succeed(times: usize, message: &str, result: Value) -> Self {
            let script = (0..times)
                .map(|_| MockBehavior::Fail(message.to_string()))
                .collect();
            Self::new(script, MockBehavior::Succeed(result))
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TaskHandler for ScriptedHandler {
        async fn execute(&self, _payload: &Value) -> Result<Value, HandlerError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            let behavior = self
                .script
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone());

            match behavior {
                MockBehavior::Succeed(result) => Ok(result),
                MockBehavior::Fail(msg) => Err(HandlerError::Failed(msg)),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
                MockBehavior::Hang(duration) => {
                    tokio::time::sleep(duration).await;
                    Ok(Value::Null)
                }
            }
        }
    }
}
