//! Error types for harness operations.

use thiserror::Error;

/// Errors from driving a server under test.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Failed to spawn server '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Transport already started")]
    AlreadyStarted,

    #[error("Transport closed")]
    TransportClosed,

    #[error("'{method}' timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },

    #[error("JSON-RPC error (code {code}): {message}")]
    Protocol {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("Validation failed: {}", diagnostics.join("; "))]
    Validation { diagnostics: Vec<String> },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Harness stopped")]
    HarnessStopped,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure category of a [`HarnessError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The server process could not start. Fatal to a run.
    Spawn,
    /// Misuse of the harness API.
    Usage,
    TransportClosed,
    Timeout,
    /// The server answered with an error object.
    Protocol,
    /// The server answered with something structurally wrong.
    Validation,
    HarnessStopped,
}

impl HarnessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HarnessError::Spawn { .. } => ErrorKind::Spawn,
            HarnessError::AlreadyStarted | HarnessError::Json(_) => ErrorKind::Usage,
            HarnessError::TransportClosed => ErrorKind::TransportClosed,
            HarnessError::Timeout { .. } => ErrorKind::Timeout,
            HarnessError::Protocol { .. } => ErrorKind::Protocol,
            HarnessError::Validation { .. } | HarnessError::UnexpectedResponse(_) => {
                ErrorKind::Validation
            }
            HarnessError::HarnessStopped => ErrorKind::HarnessStopped,
        }
    }

    /// The JSON-RPC error code, if the server answered with an error object.
    pub fn protocol_code(&self) -> Option<i64> {
        match self {
            HarnessError::Protocol { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn validation(diagnostic: impl Into<String>) -> Self {
        HarnessError::Validation {
            diagnostics: vec![diagnostic.into()],
        }
    }
}
