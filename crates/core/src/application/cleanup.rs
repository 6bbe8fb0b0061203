// Cleanup Scheduler
// Periodic removal of finished tasks

use crate::application::task_service::TaskService;
use crate::application::worker::ShutdownToken;
use crate::config::CleanupConfig;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tracing::{error, info};

/// Cleanup scheduler
///
/// Runs `TaskService::cleanup` every `interval_hours` in the background
pub struct CleanupScheduler {
    tasks: Arc<TaskService>,
    config: CleanupConfig,
}

impl CleanupScheduler {
    /// Create a new cleanup scheduler
    ///
    /// # Arguments
    /// * `tasks` - Task service
    /// * `config` - Interval and retention (hours)
    pub fn new(tasks: Arc<TaskService>, config: CleanupConfig) -> Self {
        Self { tasks, config }
    }

    fn period(&self) -> Duration {
        Duration::from_secs(self.config.interval_hours.max(1) * 3600)
    }

    /// Run cleanup loop until shutdown (background task)
    ///
    /// First run happens one interval after start. Should be spawned in tokio::spawn
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(
            interval_hours = self.config.interval_hours,
            retention_hours = self.config.retention_hours,
            "Cleanup scheduler started"
        );

        let period = self.period();
        let mut tick = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = shutdown.wait() => break,
            }

            if let Err(e) = self.run_now().await {
                error!(error = %e, "Scheduled cleanup failed");
            }
        }

        info!("Cleanup scheduler stopped");
    }

    /// Run cleanup immediately with the configured retention
    pub async fn run_now(&self) -> Result<u64> {
        let deleted = self.tasks.cleanup(self.config.retention_hours).await?;
        info!(deleted = deleted, "Cleanup run completed");
        Ok(deleted)
    }
}
