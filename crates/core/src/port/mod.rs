// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod task_handler;
pub mod task_store;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use task_handler::{HandlerError, TaskHandler};
pub use task_store::{TaskMutation, TaskStore};
pub use time_provider::TimeProvider;
