use std::io;

use thiserror::Error;

use crate::mcp::rpc::{INTERNAL_ERROR, PARSE_ERROR};

pub const PROCESS_FAILED_FALLBACK: &str = "Process failed";

/// Failures the bridge turns into JSON-RPC error responses.
///
/// The `Display` text of each variant is used verbatim as `error.message`.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{0}")]
    InvalidRequest(#[source] serde_json::Error),
    #[error("failed to spawn backend `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{message}")]
    ProcessFailed {
        exit_code: Option<i32>,
        message: String,
    },
    #[error("Parse error: {0}")]
    MalformedResponse(#[source] serde_json::Error),
}

impl BridgeError {
    /// Builds a process failure from the captured diagnostic stream.
    pub fn process_failed(exit_code: Option<i32>, stderr: &[u8]) -> Self {
        let message = if stderr.is_empty() {
            PROCESS_FAILED_FALLBACK.to_string()
        } else {
            String::from_utf8_lossy(stderr).into_owned()
        };

        Self::ProcessFailed { exit_code, message }
    }

    /// JSON-RPC error code for this failure.
    ///
    /// Malformed inbound JSON and process failures share `-32603`; only a backend
    /// that exited cleanly with unparseable output yields `-32700`.
    pub fn code(&self) -> i64 {
        match self {
            Self::MalformedResponse(_) => PARSE_ERROR,
            Self::InvalidRequest(_)
            | Self::Spawn { .. }
            | Self::Io(_)
            | Self::ProcessFailed { .. } => INTERNAL_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::Spawn { .. } => "spawn_failed",
            Self::Io(_) => "io",
            Self::ProcessFailed { .. } => "process_failed",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }
}
