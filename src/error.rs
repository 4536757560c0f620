//! Store Errors
//!
//! Backend failures are surfaced to callers as-is; this layer adds no retries
//! and no fallback to another backend.

use thiserror::Error;

/// Errors returned by session stores and the session manager
#[derive(Debug, Error)]
pub enum StoreError {
    /// Raw-connection backend failure (connection refused, timeout, protocol error)
    #[cfg(feature = "redis-backend")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Transport failure talking to the REST backend
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The REST backend answered with an error envelope or a non-success status
    #[error("upstash error ({status}): {message}")]
    Upstash { status: u16, message: String },

    /// A stored entry could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid backend configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// The store's connection was closed with `disconnect`
    #[error("store is disconnected")]
    Disconnected,
}

impl StoreError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
