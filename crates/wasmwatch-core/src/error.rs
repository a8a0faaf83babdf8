//! Error types for the watch/sync pipeline.

use thiserror::Error;

/// Errors that can occur while watching a network or syncing its state.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The connection to the network is not ready yet.
    /// Queries fail fast instead of queuing behind the reconnect loop.
    #[error("connection to '{network}' is not ready")]
    NotReady { network: String },

    /// Transport-level RPC failure (endpoint unreachable, timeout, bad HTTP status).
    #[error("RPC error: {0}")]
    Rpc(String),

    /// WebSocket subscription failure.
    #[error("subscription error: {0}")]
    Subscription(String),

    /// The node answered but rejected or failed the contract query.
    #[error("query error: {0}")]
    Query(String),

    /// Cache store failure (connection reset, write refused).
    #[error("cache error: {0}")]
    Cache(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Response could not be deserialized into the expected shape.
    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl WatchError {
    /// Returns `true` if the error is transient and the operation may
    /// succeed on a later attempt without intervention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NotReady { .. } | Self::Rpc(_) | Self::Subscription(_) | Self::Cache(_)
        )
    }
}
