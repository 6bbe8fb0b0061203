//! JSON-RPC Server
//!
//! Serves JSON-RPC 2.0 over TCP, bound to localhost by default.

use crate::error::to_rpc_error;
use crate::handler::RpcHandler;
use crate::types::{
    CancelTaskRequest, CleanupRequest, CreateTaskRequest, ListTasksRequest, TaskIdRequest,
    UpdateTaskParams,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::{ErrorObjectOwned, Params};
use jsonrpsee::RpcModule;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use taskhive_core::application::{TaskService, Worker};
use taskhive_core::error::{AppError, Result};
use tracing::info;

pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9630;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// Decode method params
///
/// Accepts a named params object, a single object wrapped in a positional
/// array, or no params at all (`null` and `[]` are treated as `{}`).
fn parse_params<T: DeserializeOwned>(params: &Params<'_>) -> std::result::Result<T, ErrorObjectOwned> {
    let raw = params.as_str().unwrap_or("{}");
    let value: Value = serde_json::from_str(raw).map_err(|e| to_rpc_error(e.into()))?;
    let object = match value {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        Value::Array(items) if items.is_empty() => Value::Object(Default::default()),
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(object).map_err(|e| to_rpc_error(AppError::Validation(e.to_string())))
}

fn registration(e: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("Failed to register method: {}", e))
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, tasks: Arc<TaskService>, worker: Arc<Worker>) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(tasks, worker)),
        }
    }

    /// Build the method table
    pub fn module(&self) -> Result<RpcModule<()>> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method("tasks.create.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: CreateTaskRequest = parse_params(&params)?;
                    handler.create(req).await
                }
            })
            .map_err(registration)?;

        let handler = self.handler.clone();
        module
            .register_async_method("tasks.get.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: TaskIdRequest = parse_params(&params)?;
                    handler.get(req).await
                }
            })
            .map_err(registration)?;

        let handler = self.handler.clone();
        module
            .register_async_method("tasks.list.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ListTasksRequest = parse_params(&params)?;
                    handler.list(req).await
                }
            })
            .map_err(registration)?;

        let handler = self.handler.clone();
        module
            .register_async_method("tasks.stats.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.stats().await }
            })
            .map_err(registration)?;

        let handler = self.handler.clone();
        module
            .register_async_method("tasks.update.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: UpdateTaskParams = parse_params(&params)?;
                    handler.update(req).await
                }
            })
            .map_err(registration)?;

        let handler = self.handler.clone();
        module
            .register_async_method("tasks.cancel.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: CancelTaskRequest = parse_params(&params)?;
                    handler.cancel(req).await
                }
            })
            .map_err(registration)?;

        let handler = self.handler.clone();
        module
            .register_async_method("tasks.retry.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: TaskIdRequest = parse_params(&params)?;
                    handler.retry(req).await
                }
            })
            .map_err(registration)?;

        let handler = self.handler.clone();
        module
            .register_async_method("tasks.delete.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: TaskIdRequest = parse_params(&params)?;
                    handler.delete(req).await
                }
            })
            .map_err(registration)?;

        let handler = self.handler.clone();
        module
            .register_async_method("tasks.cleanup.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: CleanupRequest = parse_params(&params)?;
                    handler.cleanup(req).await
                }
            })
            .map_err(registration)?;

        // Worker control
        let handler = self.handler.clone();
        module
            .register_async_method("worker.status.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.worker_status().await }
            })
            .map_err(registration)?;

        let handler = self.handler.clone();
        module
            .register_async_method("worker.restart.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.worker_restart().await }
            })
            .map_err(registration)?;

        Ok(module)
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the bound address (port 0 picks a free one) and the handle
    /// used to stop the server.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle)> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let module = self.module()?;

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to build server on {}: {}", addr, e)))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| AppError::Internal(format!("Failed to read bound address: {}", e)))?;

        info!(
            addr = %local_addr,
            methods = module.method_names().count(),
            "JSON-RPC server started"
        );

        let handle = server.start(module);
        Ok((local_addr, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;

    #[test]
    fn test_parse_params_shapes() {
        let named: TaskIdRequest = parse_params(&Params::new(Some(r#"{"taskId":"t-1"}"#))).unwrap();
        assert_eq!(named.task_id, "t-1");

        let wrapped: TaskIdRequest = parse_params(&Params::new(Some(r#"[{"taskId":"t-2"}]"#))).unwrap();
        assert_eq!(wrapped.task_id, "t-2");

        let absent: CleanupRequest = parse_params(&Params::new(None)).unwrap();
        assert_eq!(absent.older_than_hours, 24);

        let empty: CleanupRequest = parse_params(&Params::new(Some("[]"))).unwrap();
        assert_eq!(empty.older_than_hours, 24);
    }

    #[test]
    fn test_parse_params_missing_field_is_validation() {
        let err = parse_params::<TaskIdRequest>(&Params::new(Some("{}"))).unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);
    }

    #[test]
    fn test_unknown_task_type_is_validation() {
        let err = parse_params::<CreateTaskRequest>(&Params::new(Some(
            r#"{"type":"mine-bitcoin","payload":{},"createdBy":"x"}"#,
        )))
        .unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);
    }
}
