//! The `ChainClient` trait — the seam between the pipeline and a node's RPC interface.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::WatchError;

/// The operations the pipeline needs from one network's RPC endpoint.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` for use across Tokio tasks.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    /// Probe the node. Used by the connection state machine to decide
    /// whether the endpoint is reachable.
    async fn status(&self) -> Result<(), WatchError>;

    /// Height of the latest block at the chain head.
    async fn latest_height(&self) -> Result<u64, WatchError>;

    /// Number of transactions at exactly `height` that touched `contract`.
    async fn contract_tx_count(&self, contract: &str, height: u64) -> Result<u64, WatchError>;

    /// Execute a read-only smart query (e.g. `{"state": {}}`) against `contract`
    /// and return the contract-defined JSON response.
    async fn smart_query(&self, contract: &str, msg: &Value) -> Result<Value, WatchError>;
}
