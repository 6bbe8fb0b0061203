//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use taskhive_core::domain::DomainError;
use taskhive_core::error::AppError;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const INVALID_STATE: i32 = 4002;
    pub const CAPACITY_EXCEEDED: i32 = 4003;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const HANDLER_ERROR: i32 = 5002;
}

fn error_code(err: &AppError) -> i32 {
    match err {
        AppError::Validation(_) | AppError::Serialization(_) => code::VALIDATION_ERROR,
        AppError::Domain(DomainError::InvalidStateTransition { .. })
        | AppError::Domain(DomainError::NotYetDue { .. }) => code::INVALID_STATE,
        AppError::Domain(_) => code::VALIDATION_ERROR,
        AppError::NotFound(_) => code::NOT_FOUND,
        AppError::Conflict(_) => code::INVALID_STATE,
        AppError::CapacityExceeded { .. } => code::CAPACITY_EXCEEDED,
        AppError::UnregisteredHandler(_) | AppError::Handler(_) => code::HANDLER_ERROR,
        AppError::Config(_) | AppError::Internal(_) => code::INTERNAL_ERROR,
    }
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let code = error_code(&err);
    let message = match err {
        AppError::Validation(msg)
        | AppError::NotFound(msg)
        | AppError::Conflict(msg)
        | AppError::Internal(msg) => msg,
        other => other.to_string(),
    };
    ErrorObjectOwned::owned(code, message, None::<()>)
}
