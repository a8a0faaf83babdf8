//! Polling watcher strategy.
//!
//! On a fixed interval, read the latest block height; when it advances,
//! probe `/tx_search` for transactions touching the watched contract at
//! exactly that height and notify the sync engine if any matched. One
//! notification per tick at most: bursts of blocks inside a single
//! interval coalesce to the latest height only, which is fine because a
//! sync always re-fetches full current state.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::chain::ChainClient;
use crate::connection::ChainConnection;
use crate::error::WatchError;
use crate::network::Network;

#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Tick interval between height probes.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

/// Poll-based event watcher for one network.
pub struct PollWatcher<C> {
    network: Network,
    connection: ChainConnection<C>,
    config: PollConfig,
}

impl<C: ChainClient> PollWatcher<C> {
    pub fn new(network: Network, connection: ChainConnection<C>, config: PollConfig) -> Self {
        Self {
            network,
            connection,
            config,
        }
    }

    /// Watch until the receiving side of `heights` goes away.
    pub async fn run(self, heights: mpsc::UnboundedSender<u64>) {
        self.connection.ready().await;
        tracing::info!(
            network = %self.network.id,
            interval_ms = self.config.interval.as_millis() as u64,
            "poll watcher started"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_seen = 0u64;

        loop {
            ticker.tick().await;
            match self.poll_once(&mut last_seen).await {
                Ok(Some(height)) => {
                    if heights.send(height).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                // A failed tick is simply retried at the next interval.
                Err(e) => {
                    tracing::warn!(network = %self.network.id, error = %e, "poll tick failed, skipping");
                }
            }
        }
    }

    /// One tick: at most one notification, coalesced to the latest height.
    async fn poll_once(&self, last_seen: &mut u64) -> Result<Option<u64>, WatchError> {
        let height = self.connection.latest_height().await?;
        if height <= *last_seen {
            return Ok(None);
        }
        *last_seen = height;

        let txs = self
            .connection
            .contract_tx_count(&self.network.contract, height)
            .await?;
        if txs > 0 {
            tracing::info!(network = %self.network.id, height, "relevant block detected");
            Ok(Some(height))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::BackoffConfig;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    struct ScriptedChain {
        latest: AtomicU64,
        fail_tx_search: AtomicBool,
    }

    impl ScriptedChain {
        fn at(height: u64) -> Self {
            Self {
                latest: AtomicU64::new(height),
                fail_tx_search: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl ChainClient for ScriptedChain {
        async fn status(&self) -> Result<(), WatchError> {
            Ok(())
        }
        async fn latest_height(&self) -> Result<u64, WatchError> {
            Ok(self.latest.load(Ordering::SeqCst))
        }
        async fn contract_tx_count(&self, _: &str, _: u64) -> Result<u64, WatchError> {
            if self.fail_tx_search.load(Ordering::SeqCst) {
                Err(WatchError::Query("tx_search failed".into()))
            } else {
                Ok(1)
            }
        }
        async fn smart_query(&self, _: &str, _: &Value) -> Result<Value, WatchError> {
            Ok(Value::Null)
        }
    }

    fn watcher(chain: ScriptedChain) -> PollWatcher<ScriptedChain> {
        let network = Network {
            id: "local".into(),
            contract: "osmo1contract".into(),
            rpc: "http://localhost:26657".into(),
        };
        let connection = ChainConnection::start("local", chain, BackoffConfig::default());
        PollWatcher::new(network, connection, PollConfig::default())
    }

    #[tokio::test]
    async fn burst_coalesces_to_latest_height() {
        // Blocks 10, 11, 12 all appeared within one interval; the tick
        // observes the head at 12 and must notify once, with 12.
        let w = watcher(ScriptedChain::at(12));
        w.connection.ready().await;

        let mut last_seen = 9u64;
        assert_eq!(w.poll_once(&mut last_seen).await.unwrap(), Some(12));
        assert_eq!(last_seen, 12);

        // Same head on the next tick: no further notification.
        assert_eq!(w.poll_once(&mut last_seen).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unchanged_head_is_quiet() {
        let w = watcher(ScriptedChain::at(5));
        w.connection.ready().await;
        let mut last_seen = 5u64;
        assert_eq!(w.poll_once(&mut last_seen).await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_tick_recovers_on_next() {
        let chain = ScriptedChain::at(10);
        chain.fail_tx_search.store(true, Ordering::SeqCst);
        let w = watcher(chain);
        w.connection.ready().await;

        let mut last_seen = 0u64;
        assert!(w.poll_once(&mut last_seen).await.is_err());

        // Next tick with a new head succeeds.
        w.connection_chain().fail_tx_search.store(false, Ordering::SeqCst);
        w.connection_chain().latest.store(11, Ordering::SeqCst);
        assert_eq!(w.poll_once(&mut last_seen).await.unwrap(), Some(11));
    }

    impl PollWatcher<ScriptedChain> {
        fn connection_chain(&self) -> &ScriptedChain {
            self.connection.client()
        }
    }
}
