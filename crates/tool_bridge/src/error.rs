use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to launch tool server `{command}`: {source}")]
    Spawn { command: String, source: io::Error },

    #[error("tool server connection failed: {0}")]
    Connection(String),

    #[error("tool server closed the connection")]
    Disconnected,

    #[error("timed out after {timeout_secs}s waiting for `{operation}`")]
    Timeout { operation: String, timeout_secs: u64 },

    #[error("tool server protocol violation: {0}")]
    Protocol(String),

    #[error("tool server error {code}: {message}")]
    Rpc { code: i64, message: String },
}

impl BridgeError {
    pub(crate) fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}
