//! Error types for stride-core operations.
//! Keep StrideFfiError minimal and stable to avoid breaking FFI clients.

use std::path::PathBuf;

use crate::native::NativeError;

// ═══════════════════════════════════════════════════════════════════════════════
// FFI-Compatible Error (for Kotlin/Swift)
// ═══════════════════════════════════════════════════════════════════════════════

/// FFI-safe error type for use across language boundaries.
///
/// This simplified error type contains just an error message string,
/// making it compatible with UniFFI's error handling.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum StrideFfiError {
    #[error("{message}")]
    General { message: String },
}

impl From<String> for StrideFfiError {
    fn from(message: String) -> Self {
        StrideFfiError::General { message }
    }
}

impl From<&str> for StrideFfiError {
    fn from(message: &str) -> Self {
        StrideFfiError::General {
            message: message.to_string(),
        }
    }
}

impl From<StrideError> for StrideFfiError {
    fn from(err: StrideError) -> Self {
        StrideFfiError::General {
            message: err.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Internal Error (for Rust-only use)
// ═══════════════════════════════════════════════════════════════════════════════

/// All errors that can occur in stride-core operations.
///
/// Permission denial and "nothing to do" branches are not errors; they surface
/// through returned outcomes and the tracking snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StrideError {
    // ─────────────────────────────────────────────────────────────────────
    // Plan Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    // ─────────────────────────────────────────────────────────────────────
    // Native Collaborator Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Native call failed: {operation}: {source}")]
    Native {
        operation: &'static str,
        #[source]
        source: NativeError,
    },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage path has no parent directory: {0}")]
    InvalidStoragePath(PathBuf),
}

impl StrideError {
    pub(crate) fn native(operation: &'static str) -> impl FnOnce(NativeError) -> StrideError {
        move |source| StrideError::Native { operation, source }
    }
}

/// Convenience type alias for Results using StrideError.
pub type Result<T> = std::result::Result<T, StrideError>;
