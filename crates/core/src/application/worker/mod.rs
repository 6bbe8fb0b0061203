// Worker - Task execution loop

pub mod constants;
mod shutdown;
mod status;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use status::WorkerStatus;

use crate::application::registry::HandlerRegistry;
use crate::application::scheduler::TaskScheduler;
use crate::application::task_service::TaskService;
use crate::config::WorkerConfig;
use crate::domain::Task;
use crate::error::{AppError, Result};
use crate::port::{HandlerError, TimeProvider};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// What one handler invocation produced
enum Outcome {
    Success(Value),
    Failure(HandlerError),
    Unregistered,
}

struct LoopControl {
    shutdown: ShutdownSender,
    handle: JoinHandle<()>,
}

/// Worker claims tasks one at a time and settles each before the next
pub struct Worker {
    scheduler: Arc<TaskScheduler>,
    tasks: Arc<TaskService>,
    registry: Arc<HandlerRegistry>,
    time_provider: Arc<dyn TimeProvider>,
    config: WorkerConfig,
    status: RwLock<WorkerStatus>,
    control: Mutex<Option<LoopControl>>,
}

impl Worker {
    pub fn new(
        scheduler: Arc<TaskScheduler>,
        tasks: Arc<TaskService>,
        registry: Arc<HandlerRegistry>,
        time_provider: Arc<dyn TimeProvider>,
        config: WorkerConfig,
    ) -> Self {
        let status = WorkerStatus::new(time_provider.now_millis());
        Self {
            scheduler,
            tasks,
            registry,
            time_provider,
            config,
            status: RwLock::new(status),
            control: Mutex::new(None),
        }
    }

    /// Spawn the loop on the tokio runtime
    ///
    /// Returns false if the loop is already running.
    pub async fn start(self: &Arc<Self>) -> bool {
        let mut control = self.control.lock().await;
        if control.is_some() {
            debug!("Worker already running");
            return false;
        }

        let (shutdown, token) = shutdown_channel();
        self.status.write().await.running = true;

        let worker = Arc::clone(self);
        let handle = tokio::spawn(async move { worker.run(token).await });
        *control = Some(LoopControl { shutdown, handle });

        info!(
            handlers = ?self.registry.registered_types(),
            "Worker started"
        );
        true
    }

    /// Signal the loop to stop
    ///
    /// The task in flight is settled before the loop exits. Returns the
    /// loop's handle, `None` if it was not running.
    pub async fn stop(&self) -> Option<JoinHandle<()>> {
        // `running` only changes under the control lock
        let mut slot = self.control.lock().await;
        let control = slot.take()?;
        control.shutdown.shutdown();
        self.status.write().await.running = false;
        drop(slot);

        info!("Worker stopping");
        Some(control.handle)
    }

    /// Stop and wait for the loop to exit
    pub async fn shutdown_and_join(&self) {
        if let Some(handle) = self.stop().await {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker loop ended abnormally");
            }
        }
    }

    /// Stop, pause, start again; counters are kept
    pub async fn restart(self: &Arc<Self>) {
        let before = self.status().await;
        info!(
            processed_count = before.processed_count,
            failed_count = before.failed_count,
            "Restarting worker"
        );

        self.shutdown_and_join().await;
        sleep(self.config.restart_pause).await;
        self.start().await;
    }

    pub async fn status(&self) -> WorkerStatus {
        self.status.read().await.clone()
    }

    async fn run(&self, mut shutdown: ShutdownToken) {
        loop {
            if shutdown.is_shutdown() {
                break;
            }

            let delay = match self.process_next_task().await {
                Ok(true) => self.config.rearm_delay,
                Ok(false) => self.config.idle_delay,
                Err(e) => {
                    error!(error = %e, "Worker error");
                    self.config.error_backoff
                }
            };

            tokio::select! {
                _ = sleep(delay) => {},
                _ = shutdown.wait() => break,
            }
        }
        info!("Worker stopped");
    }

    /// Claim and settle one task (returns true if a task was processed)
    pub async fn process_next_task(&self) -> Result<bool> {
        let Some(task) = self.scheduler.claim_next().await? else {
            return Ok(false);
        };

        self.mark_busy(&task).await;
        info!(
            task_id = %task.id,
            task_type = %task.task_type,
            attempt = task.retry_count + 1,
            "Processing task"
        );

        let started = Instant::now();
        let outcome = self.execute(&task).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let settled = self.settle(&task, outcome, elapsed_ms).await;
        self.mark_idle().await;

        settled.map(|_| true)
    }

    /// Run the handler in its own tokio task, bounded by `handler_timeout`
    async fn execute(&self, task: &Task) -> Outcome {
        let Some(handler) = self.registry.get(task.task_type) else {
            return Outcome::Unregistered;
        };

        let payload = task.payload.clone();
        let timeout = self.config.handler_timeout;
        let handle = tokio::spawn(async move {
            tokio::time::timeout(timeout, handler.execute(&payload)).await
        });

        // Panics surface as a JoinError instead of unwinding into the loop
        match handle.await {
            Ok(Ok(Ok(result))) => Outcome::Success(result),
            Ok(Ok(Err(e))) => Outcome::Failure(e),
            Ok(Err(_elapsed)) => {
                warn!(
                    task_id = %task.id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Handler timed out"
                );
                Outcome::Failure(HandlerError::Timeout(timeout.as_millis() as u64))
            }
            Err(join_err) if join_err.is_panic() => {
                let panic = join_err.into_panic();
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(task_id = %task.id, panic = %message, "Handler panicked");
                Outcome::Failure(HandlerError::Panicked(message))
            }
            Err(join_err) => Outcome::Failure(HandlerError::Failed(join_err.to_string())),
        }
    }

    async fn settle(&self, task: &Task, outcome: Outcome, elapsed_ms: u64) -> Result<()> {
        match outcome {
            Outcome::Success(result) => {
                self.tasks.record_success(&task.id, result, elapsed_ms).await?;
                self.status.write().await.processed_count += 1;
            }
            Outcome::Failure(e) => {
                self.tasks
                    .record_failure(&task.id, &e.to_string(), Some(elapsed_ms))
                    .await?;
                self.status.write().await.failed_count += 1;
            }
            Outcome::Unregistered => {
                let e = AppError::UnregisteredHandler(task.task_type);
                self.tasks
                    .record_permanent_failure(&task.id, &e.to_string(), Some(elapsed_ms))
                    .await?;
                self.status.write().await.failed_count += 1;
            }
        }
        Ok(())
    }

    async fn mark_busy(&self, task: &Task) {
        let mut status = self.status.write().await;
        status.current_task_id = Some(task.id.clone());
        status.last_activity = Some(self.time_provider.now_millis());
    }

    async fn mark_idle(&self) {
        let mut status = self.status.write().await;
        status.current_task_id = None;
        status.last_activity = Some(self.time_provider.now_millis());
    }
}
