//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 server for the Taskhive task engine.
//! Method names are versioned (`tasks.create.v1`, `worker.status.v1`).

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
