//! Taskhive Task Engine - Main Entry Point
//! JSON-RPC Server + Worker + Cleanup Scheduler over an in-memory store

mod config;
mod logging;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DaemonConfig;
use taskhive_api_rpc::RpcServer;
use taskhive_core::application::{
    shutdown_channel, CleanupScheduler, HandlerRegistry, RetryPolicy, TaskScheduler, TaskService,
    Worker,
};
use taskhive_core::port::id_provider::UuidProvider;
use taskhive_core::port::time_provider::SystemTimeProvider;
use taskhive_core::port::{IdProvider, TaskStore, TimeProvider};
use taskhive_core::VERSION;
use taskhive_infra_handlers::register_defaults;
use taskhive_infra_memory::InMemoryTaskStore;

/// How long the worker gets to settle its in-flight task on shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env()?;

    // 2. Initialize logging
    let _log_guard = logging::init(&config.log)?;

    info!("Taskhive Task Engine v{} starting...", VERSION);
    info!(
        max_queue_size = config.engine.store.max_queue_size,
        handler_timeout_ms = config.engine.worker.handler_timeout.as_millis() as u64,
        retry_base_delay_ms = config.engine.retry.base_delay_ms,
        backend_url = %config.handlers.backend_url,
        "Configuration loaded"
    );

    // 3. Setup dependencies (DI wiring)
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let id_provider: Arc<dyn IdProvider> = Arc::new(UuidProvider);
    let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::from_config(
        time_provider.clone(),
        &config.engine.store,
    ));

    let tasks = Arc::new(TaskService::new(
        store.clone(),
        id_provider,
        time_provider.clone(),
        RetryPolicy::new(&config.engine.retry),
    ));
    let scheduler = Arc::new(TaskScheduler::new(store, time_provider.clone()));

    let mut registry = HandlerRegistry::new();
    register_defaults(&mut registry, &config.handlers, time_provider.clone())?;
    let missing = registry.missing_types();
    if !missing.is_empty() {
        warn!(missing = ?missing, "Some task types have no handler");
    }

    let worker = Arc::new(Worker::new(
        scheduler,
        tasks.clone(),
        Arc::new(registry),
        time_provider,
        config.engine.worker.clone(),
    ));

    // 4. Start JSON-RPC server
    let rpc_server = RpcServer::new(config.rpc.clone(), tasks.clone(), worker.clone());
    let (rpc_addr, rpc_handle) = rpc_server.start().await?;

    // 5. Start worker
    worker.start().await;

    // 6. Start cleanup scheduler
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let cleanup = CleanupScheduler::new(tasks.clone(), config.engine.cleanup.clone());
    let cleanup_handle = tokio::spawn(cleanup.run(shutdown_rx));

    info!(
        rpc_addr = %rpc_addr,
        capacity = tasks.capacity(),
        "System ready. Waiting for tasks..."
    );

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown: stop intake first, then drain the worker
    if let Err(e) = rpc_handle.stop() {
        warn!(error = %e, "RPC server already stopped");
    }
    shutdown_tx.shutdown();

    if tokio::time::timeout(SHUTDOWN_GRACE, worker.shutdown_and_join())
        .await
        .is_err()
    {
        warn!(
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "Worker did not stop within grace period"
        );
    }
    if let Err(e) = cleanup_handle.await {
        warn!(error = %e, "Cleanup scheduler ended abnormally");
    }
    rpc_handle.stopped().await;

    info!("Shutdown complete");
    Ok(())
}
