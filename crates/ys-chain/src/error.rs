use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use yieldscope_types::ChainId;

/// Failure of a single chain interaction.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Unknown chain: {0}")]
    UnknownChain(ChainId),

    #[error("No APR oracle deployed on chain {0}")]
    OracleUnavailable(ChainId),

    #[error("RPC request '{operation}' failed: {message}")]
    Rpc { operation: String, message: String },

    #[error("RPC request '{operation}' timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    #[error("Failed to decode log: {0}")]
    Decode(String),
}

impl ChainError {
    /// Create an `Rpc` error with operation context
    pub fn rpc(operation: impl Display, message: impl Display) -> Self {
        Self::Rpc {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    pub fn timeout(operation: impl Display, timeout: Duration) -> Self {
        Self::Timeout {
            operation: operation.to_string(),
            timeout,
        }
    }

    pub fn decode(message: impl Display) -> Self {
        Self::Decode(message.to_string())
    }

    /// Transient failures are worth retrying on the next indexing cycle.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Rpc { .. } | Self::Timeout { .. })
    }
}

/// Error type for the chain configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read chains config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse chains config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid chains config: {0}")]
    Invalid(String),
}
