//! Network descriptors and the registry that owns their connections.

use serde::{Deserialize, Serialize};

use crate::chain::ChainClient;
use crate::connection::{BackoffConfig, ChainConnection};

/// One independent blockchain deployment and its target contract.
/// Immutable once loaded; connection state lives in [`ChainConnection`],
/// never on the descriptor itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    /// Unique network id (used as the cache key prefix).
    pub id: String,
    /// Bech32 address of the watched contract.
    pub contract: String,
    /// Tendermint RPC endpoint URL.
    pub rpc: String,
}

/// A configured network plus its owned connection.
pub struct NetworkEntry<C> {
    pub network: Network,
    pub connection: ChainConnection<C>,
}

/// Static table of configured networks.
///
/// Eagerly starts one connect loop per entry at construction; consumers
/// await [`ChainConnection::ready`] before the first query and rely on the
/// connection to self-heal afterwards.
pub struct NetworkRegistry<C> {
    entries: Vec<NetworkEntry<C>>,
}

impl<C: ChainClient> NetworkRegistry<C> {
    /// Build the registry, starting a connection for every network.
    pub fn start(
        networks: Vec<Network>,
        backoff: BackoffConfig,
        make_client: impl Fn(&Network) -> C,
    ) -> Self {
        let entries = networks
            .into_iter()
            .map(|network| {
                let client = make_client(&network);
                let connection =
                    ChainConnection::start(network.id.clone(), client, backoff.clone());
                NetworkEntry {
                    network,
                    connection,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[NetworkEntry<C>] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&NetworkEntry<C>> {
        self.entries.iter().find(|e| e.network.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WatchError;
    use async_trait::async_trait;
    use serde_json::Value;

    struct OkClient;

    #[async_trait]
    impl ChainClient for OkClient {
        async fn status(&self) -> Result<(), WatchError> {
            Ok(())
        }
        async fn latest_height(&self) -> Result<u64, WatchError> {
            Ok(1)
        }
        async fn contract_tx_count(&self, _: &str, _: u64) -> Result<u64, WatchError> {
            Ok(0)
        }
        async fn smart_query(&self, _: &str, _: &Value) -> Result<Value, WatchError> {
            Ok(Value::Null)
        }
    }

    fn network(id: &str) -> Network {
        Network {
            id: id.into(),
            contract: "osmo1contract".into(),
            rpc: "http://localhost:26657".into(),
        }
    }

    #[tokio::test]
    async fn registry_starts_all_entries() {
        let registry = NetworkRegistry::start(
            vec![network("osmosis"), network("canary")],
            BackoffConfig::default(),
            |_| OkClient,
        );
        assert_eq!(registry.len(), 2);
        assert!(registry.get("canary").is_some());
        assert!(registry.get("missing").is_none());

        for entry in registry.entries() {
            entry.connection.ready().await;
        }
    }
}
