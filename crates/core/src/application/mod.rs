// Application Layer - Use Cases and Business Logic

pub mod cleanup;
pub mod registry;
pub mod retry;
pub mod scheduler;
pub mod task_service;
pub mod worker;

// Re-exports
pub use cleanup::CleanupScheduler;
pub use registry::HandlerRegistry;
pub use retry::{RetryDecision, RetryPolicy};
pub use scheduler::TaskScheduler;
pub use task_service::{CreateTaskRequest, TaskService, UpdateTaskRequest};
pub use worker::{shutdown_channel, ShutdownSender, ShutdownToken, Worker, WorkerStatus};
