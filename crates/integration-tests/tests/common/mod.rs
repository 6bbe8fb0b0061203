//! Shared wiring for integration tests
//!
//! Every harness runs on a manual clock so eligibility, durations measured
//! by the store and cleanup cutoffs are deterministic.

#![allow(dead_code)]

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use taskhive_core::application::{
    CreateTaskRequest, HandlerRegistry, RetryPolicy, TaskScheduler, TaskService, Worker,
};
use taskhive_core::config::{WorkerConfig, DEFAULT_MAX_QUEUE_SIZE};
use taskhive_core::domain::{Task, TaskPriority, TaskType};
use taskhive_core::port::id_provider::mocks::SequentialIdProvider;
use taskhive_core::port::time_provider::mocks::ManualTimeProvider;
use taskhive_core::port::{TaskHandler, TaskStore, TimeProvider};
use taskhive_infra_memory::InMemoryTaskStore;

/// 2023-11-14T22:13:20Z
pub const START_MILLIS: i64 = 1_700_000_000_000;

pub struct Harness {
    pub clock: Arc<ManualTimeProvider>,
    pub store: Arc<dyn TaskStore>,
    pub tasks: Arc<TaskService>,
    pub scheduler: Arc<TaskScheduler>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_QUEUE_SIZE)
    }

    pub fn with_capacity(max_size: usize) -> Self {
        let clock = Arc::new(ManualTimeProvider::new(START_MILLIS));
        let time: Arc<dyn TimeProvider> = clock.clone();
        let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new(time.clone(), max_size));

        let tasks = Arc::new(TaskService::new(
            store.clone(),
            Arc::new(SequentialIdProvider::new()),
            time.clone(),
            RetryPolicy::default(),
        ));
        let scheduler = Arc::new(TaskScheduler::new(store.clone(), time));

        Self {
            clock,
            store,
            tasks,
            scheduler,
        }
    }

    pub fn time(&self) -> Arc<dyn TimeProvider> {
        self.clock.clone()
    }

    /// Worker with one handler bound to `task_type`
    pub fn worker_with(&self, task_type: TaskType, handler: Arc<dyn TaskHandler>) -> Arc<Worker> {
        let mut registry = HandlerRegistry::new();
        registry
            .register(task_type, handler)
            .expect("fresh registry accepts handler");
        self.worker(registry)
    }

    pub fn worker(&self, registry: HandlerRegistry) -> Arc<Worker> {
        Arc::new(Worker::new(
            self.scheduler.clone(),
            self.tasks.clone(),
            Arc::new(registry),
            self.time(),
            fast_worker_config(),
        ))
    }

    pub async fn create(&self, task_type: TaskType, priority: TaskPriority) -> Task {
        self.tasks
            .create(request(task_type).with_priority(priority))
            .await
            .expect("create task")
    }

    /// Claim, advance the clock by `duration_ms`, then complete
    pub async fn complete_next(&self, duration_ms: i64) -> Task {
        let claimed = self
            .scheduler
            .claim_next()
            .await
            .expect("claim")
            .expect("an eligible task");
        self.clock.advance(duration_ms);
        self.tasks
            .record_success(&claimed.id, json!({"ok": true}), duration_ms as u64)
            .await
            .expect("record success")
    }
}

pub fn request(task_type: TaskType) -> CreateTaskRequest {
    CreateTaskRequest::new(task_type, json!({"userId": "u-1"}), "integration-test")
}

/// Short delays so loop-driven tests finish quickly
pub fn fast_worker_config() -> WorkerConfig {
    WorkerConfig {
        idle_delay: Duration::from_millis(10),
        rearm_delay: Duration::from_millis(1),
        error_backoff: Duration::from_millis(10),
        handler_timeout: Duration::from_millis(200),
        restart_pause: Duration::from_millis(10),
    }
}

/// Poll `check` until it holds or `within` elapses
pub async fn eventually<F, Fut>(within: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + within;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
