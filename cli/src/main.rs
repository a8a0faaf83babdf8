//! wasmwatch daemon.
//!
//! Loads the network table, connects the cache store, and wires one
//! watcher + sync engine pair per enabled network. Runs until ctrl-c,
//! then signals subscription watchers to unsubscribe before exiting.
//!
//! Usage:
//! ```bash
//! wasmwatch [config.json]          # default: wasmwatch.json
//! WASMWATCH_CACHE_URL=redis://...  # overrides the file's cache_url
//! ```

mod config;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

use wasmwatch_cache::RedisCacheStore;
use wasmwatch_core::{
    BackoffConfig, Network, NetworkRegistry, PollConfig, PollWatcher, SyncConfig, SyncEngine,
};
use wasmwatch_rpc::HttpChainClient;
use wasmwatch_ws::{SubscriptionWatcher, WsConfig};

use config::{Config, WatchStrategy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "wasmwatch.json".into());
    let config = Config::load(Path::new(&path))?;

    let networks: Vec<Network> = config.enabled_networks().map(|n| n.network()).collect();
    anyhow::ensure!(!networks.is_empty(), "no enabled networks configured");
    tracing::info!(config = %path, networks = networks.len(), "starting wasmwatch");

    let cache = Arc::new(RedisCacheStore::connect(&config.cache_url).await?);

    let registry = NetworkRegistry::start(networks, BackoffConfig::default(), |network| {
        HttpChainClient::default_for(&network.rpc)
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sync_config = SyncConfig {
        startup_delay: Duration::from_millis(config.startup_delay_ms),
        durable_cursor: config.durable_cursor,
    };

    for network_config in config.enabled_networks() {
        let entry = registry
            .get(&network_config.id)
            .context("network missing from registry")?;
        let (heights_tx, heights_rx) = mpsc::unbounded_channel();

        let engine = Arc::new(SyncEngine::new(
            entry.network.clone(),
            entry.connection.clone(),
            Arc::clone(&cache),
            sync_config.clone(),
        ));
        tokio::spawn(engine.run(heights_rx));

        match network_config.strategy {
            WatchStrategy::Poll => {
                let watcher = PollWatcher::new(
                    entry.network.clone(),
                    entry.connection.clone(),
                    PollConfig {
                        interval: Duration::from_millis(network_config.poll_interval_ms),
                    },
                );
                tokio::spawn(watcher.run(heights_tx));
            }
            WatchStrategy::Subscribe => {
                let watcher =
                    SubscriptionWatcher::new(entry.network.clone(), WsConfig::default());
                tokio::spawn(watcher.run(heights_tx, shutdown_rx.clone()));
            }
        }
        tracing::info!(
            network = %network_config.id,
            strategy = ?network_config.strategy,
            "network wired"
        );
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown requested");
    let _ = shutdown_tx.send(true);
    // Grace period for best-effort unsubscribes.
    tokio::time::sleep(Duration::from_millis(500)).await;
    Ok(())
}
