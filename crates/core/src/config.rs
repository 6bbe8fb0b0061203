// Engine Configuration
// Plain structs with defaults; the daemon fills them from the environment.

use crate::application::worker::constants::{
    ERROR_RECOVERY_DELAY, HANDLER_TIMEOUT, IDLE_DELAY, REARM_DELAY, RESTART_PAUSE,
};
use std::time::Duration;

/// Default store ceiling
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;

/// Default cleanup cadence (hourly)
pub const DEFAULT_CLEANUP_INTERVAL_HOURS: u64 = 1;

/// Default age after which finished tasks are removed
pub const DEFAULT_RETENTION_HOURS: u64 = 24;

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub store: StoreConfig,
    pub worker: WorkerConfig,
    pub retry: RetryConfig,
    pub cleanup: CleanupConfig,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `insert` is rejected once the store holds this many tasks
    pub max_queue_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub idle_delay: Duration,
    pub rearm_delay: Duration,
    pub error_backoff: Duration,
    pub handler_timeout: Duration,
    pub restart_pause: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            idle_delay: IDLE_DELAY,
            rearm_delay: REARM_DELAY,
            error_backoff: ERROR_RECOVERY_DELAY,
            handler_timeout: HANDLER_TIMEOUT,
            restart_pause: RESTART_PAUSE,
        }
    }
}

/// Retry backoff
///
/// `base_delay_ms = 0` re-queues failed attempts immediately.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub base_delay_ms: i64,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 0,
            backoff_factor: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub interval_hours: u64,
    pub retention_hours: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_hours: DEFAULT_CLEANUP_INTERVAL_HOURS,
            retention_hours: DEFAULT_RETENTION_HOURS,
        }
    }
}
