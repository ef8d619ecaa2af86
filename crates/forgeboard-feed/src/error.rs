//! Feed client error types.

use thiserror::Error;

/// Feed client error type.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("timeout error: {0}")]
    Timeout(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Feed client result type.
pub type Result<T> = std::result::Result<T, FeedError>;
