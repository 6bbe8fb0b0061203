//! RPC Method Handlers
//!
//! Thin adapters from RPC params to `TaskService` and `Worker` calls.

use crate::error::to_rpc_error;
use crate::types::{
    CancelTaskRequest, CleanupRequest, CleanupResponse, CreateTaskRequest, DeleteTaskResponse,
    ListTasksRequest, ListTasksResponse, RestartResponse, TaskIdRequest, UpdateTaskParams,
};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use taskhive_core::application::{TaskService, Worker, WorkerStatus};
use taskhive_core::domain::{Task, TaskStats};
use tracing::debug;

type RpcResult<T> = Result<T, ErrorObjectOwned>;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    tasks: Arc<TaskService>,
    worker: Arc<Worker>,
}

impl RpcHandler {
    pub fn new(tasks: Arc<TaskService>, worker: Arc<Worker>) -> Self {
        Self { tasks, worker }
    }

    /// tasks.create.v1
    pub async fn create(&self, req: CreateTaskRequest) -> RpcResult<Task> {
        self.tasks.create(req).await.map_err(to_rpc_error)
    }

    /// tasks.get.v1
    pub async fn get(&self, req: TaskIdRequest) -> RpcResult<Task> {
        self.tasks.get(&req.task_id).await.map_err(to_rpc_error)
    }

    /// tasks.list.v1
    pub async fn list(&self, req: ListTasksRequest) -> RpcResult<ListTasksResponse> {
        let tasks = self
            .tasks
            .list(&req.filter, req.limit, req.offset)
            .await
            .map_err(to_rpc_error)?;

        debug!(filter = ?req.filter, result_count = tasks.len(), "Task list request");

        Ok(ListTasksResponse {
            count: tasks.len(),
            tasks,
            limit: req.limit,
            offset: req.offset,
        })
    }

    /// tasks.stats.v1
    pub async fn stats(&self) -> RpcResult<TaskStats> {
        self.tasks.statistics().await.map_err(to_rpc_error)
    }

    /// tasks.update.v1
    pub async fn update(&self, req: UpdateTaskParams) -> RpcResult<Task> {
        self.tasks
            .update(&req.task_id, req.changes)
            .await
            .map_err(to_rpc_error)
    }

    /// tasks.cancel.v1
    pub async fn cancel(&self, req: CancelTaskRequest) -> RpcResult<Task> {
        self.tasks
            .cancel(&req.task_id, req.reason)
            .await
            .map_err(to_rpc_error)
    }

    /// tasks.retry.v1
    pub async fn retry(&self, req: TaskIdRequest) -> RpcResult<Task> {
        self.tasks
            .request_retry(&req.task_id)
            .await
            .map_err(to_rpc_error)
    }

    /// tasks.delete.v1
    pub async fn delete(&self, req: TaskIdRequest) -> RpcResult<DeleteTaskResponse> {
        self.tasks.delete(&req.task_id).await.map_err(to_rpc_error)?;
        Ok(DeleteTaskResponse {
            task_id: req.task_id,
            deleted: true,
        })
    }

    /// tasks.cleanup.v1
    pub async fn cleanup(&self, req: CleanupRequest) -> RpcResult<CleanupResponse> {
        let deleted_count = self
            .tasks
            .cleanup(req.older_than_hours)
            .await
            .map_err(to_rpc_error)?;
        Ok(CleanupResponse { deleted_count })
    }

    /// worker.status.v1
    pub async fn worker_status(&self) -> RpcResult<WorkerStatus> {
        Ok(self.worker.status().await)
    }

    /// worker.restart.v1
    pub async fn worker_restart(&self) -> RpcResult<RestartResponse> {
        self.worker.restart().await;
        Ok(RestartResponse { restarted: true })
    }
}
