//! The per-network sync engine.
//!
//! Consumes candidate heights from a watcher, guards them through the
//! [`SyncCursor`], and runs the fetch → derive → write cycle against the
//! cache. Duplicate and stale heights are no-ops; syncs for distinct
//! heights may overlap (freshness over sequencing — the cache is
//! last-write-wins, and every sync re-fetches full current state).

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use crate::cache::CacheStore;
use crate::chain::ChainClient;
use crate::connection::ChainConnection;
use crate::cursor::SyncCursor;
use crate::index::{claimable_index, BatchList};
use crate::keys;
use crate::network::Network;
use crate::error::WatchError;

/// Sync engine tuning knobs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Delay before the startup sync that seeds the cache even if no new
    /// activity has occurred since the last restart.
    pub startup_delay: Duration,
    /// Persist the cursor under `{N}-height` and read it back at startup.
    /// Off by default: the baseline cursor resets to zero on restart.
    pub durable_cursor: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_millis(200),
            durable_cursor: false,
        }
    }
}

/// One network's sync state machine.
pub struct SyncEngine<C, S> {
    network: Network,
    connection: ChainConnection<C>,
    cache: Arc<S>,
    cursor: SyncCursor,
    config: SyncConfig,
}

impl<C: ChainClient, S: CacheStore> SyncEngine<C, S> {
    pub fn new(
        network: Network,
        connection: ChainConnection<C>,
        cache: Arc<S>,
        config: SyncConfig,
    ) -> Self {
        Self {
            network,
            connection,
            cache,
            cursor: SyncCursor::new(),
            config,
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn cursor(&self) -> &SyncCursor {
        &self.cursor
    }

    /// Offer a candidate height from a watcher.
    ///
    /// Advances the cursor *before* the fetch begins, so a second
    /// notification for the same or a lower height arriving mid-fetch is
    /// rejected. Returns `true` if a sync was started. A failed sync is
    /// not retried at its own height; the next accepted height re-fetches
    /// full current state, so the cache always reflects the latest
    /// successfully completed sync.
    pub fn offer(self: Arc<Self>, height: u64) -> bool {
        if !self.cursor.try_advance(height) {
            tracing::debug!(
                network = %self.network.id,
                height,
                cursor = self.cursor.get(),
                "stale or duplicate height, skipping"
            );
            return false;
        }
        let engine = Arc::clone(&self);
        tokio::spawn(async move {
            if let Err(e) = engine.sync_once(Some(height)).await {
                tracing::warn!(
                    network = %engine.network.id,
                    height,
                    error = %e,
                    "sync failed, cache left at last successful values"
                );
            }
        });
        true
    }

    /// Consume heights until the channel closes.
    ///
    /// Seeds the durable cursor first (when enabled), then schedules the
    /// startup sync, then loops on watcher notifications.
    pub async fn run(self: Arc<Self>, mut heights: mpsc::UnboundedReceiver<u64>) {
        if self.config.durable_cursor {
            self.seed_from_cache().await;
        }

        let engine = Arc::clone(&self);
        tokio::spawn(async move {
            tokio::time::sleep(engine.config.startup_delay).await;
            if let Err(e) = engine.sync_once(None).await {
                tracing::warn!(
                    network = %engine.network.id,
                    error = %e,
                    "startup sync failed"
                );
            }
        });

        while let Some(height) = heights.recv().await {
            Arc::clone(&self).offer(height);
        }
        tracing::debug!(network = %self.network.id, "height channel closed, sync engine stopping");
    }

    async fn seed_from_cache(&self) {
        match self.cache.get(&keys::height(&self.network.id)).await {
            Ok(Some(raw)) => match raw.parse::<u64>() {
                Ok(height) => {
                    self.cursor.seed(height);
                    tracing::info!(network = %self.network.id, height, "cursor seeded from cache");
                }
                Err(_) => {
                    tracing::warn!(network = %self.network.id, value = %raw, "unparseable durable cursor, starting from zero");
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(network = %self.network.id, error = %e, "durable cursor read failed, starting from zero");
            }
        }
    }

    /// One complete fetch-state → fetch-batches → derive-index → write cycle.
    ///
    /// Writes are independent per key and not atomic across the schema: a
    /// failure mid-cycle leaves earlier keys at the new values and later
    /// keys at the previous sync's values. `{N}-updated` is written last
    /// so readers can use it as the staleness signal.
    pub async fn sync_once(&self, height: Option<u64>) -> Result<(), WatchError> {
        self.connection.ready().await;
        let id = &self.network.id;
        let contract = &self.network.contract;

        let state = self.connection.smart_query(contract, &json!({"state": {}})).await?;
        self.cache.set(&keys::state(id), &state.to_string()).await?;

        let raw = self.connection.smart_query(contract, &json!({"batches": {}})).await?;
        let list: BatchList = serde_json::from_value(raw)?;
        // The `.batches` array only, never the wrapper object.
        self.cache
            .set(&keys::batches(id), &serde_json::to_string(&list.batches)?)
            .await?;

        for (user, batch_ids) in claimable_index(&list.batches) {
            self.cache
                .set(&keys::claimable(id, &user), &serde_json::to_string(&batch_ids)?)
                .await?;
        }

        if self.config.durable_cursor {
            if let Some(h) = height {
                self.cache.set(&keys::height(id), &h.to_string()).await?;
            }
        }

        let now_ms = chrono::Utc::now().timestamp_millis();
        self.cache.set(&keys::updated(id), &now_ms.to_string()).await?;

        tracing::info!(network = %id, height, "cache updated");
        Ok(())
    }
}
