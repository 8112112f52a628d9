//! Error codes and typed errors
//!
//! Three kinds of failure meet here:
//!
//! - **Transport** ([`BridgeError`]): the native bridge could not be reached or
//!   spoke garbage. Stopped at the dispatcher and turned into an envelope.
//! - **Application**: business-rule errors produced by a backend, carried
//!   through the envelope untouched.
//! - **Validation**: client-side pre-checks that fail before any round trip.
//!
//! Application and validation errors both surface as [`SdkError`].

use crate::types::EngineError;
use serde_json::Value;

/// Wire error codes
pub mod codes {
    pub const NOT_CONNECTED: &str = "NOT_CONNECTED";
    pub const NOT_AUTHENTICATED: &str = "NOT_AUTHENTICATED";
    pub const HOME_GRANT_REQUIRED: &str = "HOME_GRANT_REQUIRED";
    pub const INVALID_OP: &str = "INVALID_OP";
    pub const INVALID_PAYLOAD: &str = "INVALID_PAYLOAD";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const VAULT_NOT_INITIALIZED: &str = "VAULT_NOT_INITIALIZED";
    pub const SECRET_NOT_FOUND: &str = "SECRET_NOT_FOUND";
    pub const FILE_NOT_FOUND: &str = "FILE_NOT_FOUND";
    pub const PATH_TRAVERSAL_DENIED: &str = "PATH_TRAVERSAL_DENIED";
    pub const NOT_IMPLEMENTED: &str = "NOT_IMPLEMENTED";
    pub const INVALID_NODE_ID: &str = "INVALID_NODE_ID";
    pub const INVALID_NODE_SECRET: &str = "INVALID_NODE_SECRET";
    pub const CREDENTIALS_STORE_ERROR: &str = "CREDENTIALS_STORE_ERROR";
    /// Local-only operation issued while the native bridge is unreachable.
    /// The name is kept for compatibility with existing UI code.
    pub const TAURI_NOT_READY: &str = "TAURI_NOT_READY";
    pub const DEPRECATED: &str = "DEPRECATED";
    pub const UNKNOWN: &str = "UNKNOWN";
}

/// Error returned by operation client calls
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} ({code})")]
pub struct SdkError {
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
    pub status: Option<u16>,
}

pub type SdkResult<T> = Result<T, SdkError>;

impl SdkError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            status: None,
        }
    }

    /// Client-side pre-check failure. Same shape as a backend error so UI code
    /// displays both the same way.
    pub fn validation(code: &str, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    pub fn from_envelope(error: EngineError) -> Self {
        Self {
            code: error.code,
            message: error.message,
            details: error.details,
            status: error.status,
        }
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

impl From<EngineError> for SdkError {
    fn from(error: EngineError) -> Self {
        Self::from_envelope(error)
    }
}

/// Transport-level failure talking to the native bridge
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("native bridge unavailable: {0}")]
    Unavailable(String),
    #[error("failed to spawn native bridge: {0}")]
    Spawn(String),
    #[error("native bridge I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("native bridge did not respond within {secs}s for op: {op}")]
    Timeout { op: String, secs: u64 },
    #[error("native bridge protocol error: {0}")]
    Protocol(String),
    #[error("native bridge closed the connection")]
    Closed,
}

/// Scrub an error message before it reaches the UI or the logs.
///
/// Lines that look like they carry a local filesystem path are replaced and
/// the whole message is capped at 200 characters.
pub fn sanitize_error(error: &str) -> String {
    let sanitized = error
        .lines()
        .map(|line| {
            if line.contains('/') && (line.contains("home") || line.contains("Users") || line.contains("tmp")) {
                "[path redacted]".to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if sanitized.chars().count() > 200 {
        let truncated: String = sanitized.chars().take(200).collect();
        format!("{}...", truncated)
    } else {
        sanitized
    }
}
