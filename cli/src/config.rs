//! Daemon configuration.
//!
//! A JSON file holding the cache URL and the static per-network table.
//! `WASMWATCH_CACHE_URL` overrides the file's cache URL so deployments
//! can keep credentials out of the config.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use wasmwatch_core::Network;

/// Which event-watcher strategy a network uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchStrategy {
    /// Fixed-interval `/block` + `/tx_search` polling.
    #[default]
    Poll,
    /// Persistent WebSocket subscription.
    Subscribe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub id: String,
    pub contract: String,
    pub rpc: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub strategy: WatchStrategy,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl NetworkConfig {
    pub fn network(&self) -> Network {
        Network {
            id: self.id.clone(),
            contract: self.contract.clone(),
            rpc: self.rpc.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cache store URL (e.g. `redis://127.0.0.1:6379`).
    pub cache_url: String,
    /// Persist the sync cursor in the cache and read it back at startup.
    #[serde(default)]
    pub durable_cursor: bool,
    /// Delay before the cache-seeding startup sync.
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
    pub networks: Vec<NetworkConfig>,
}

fn default_enabled() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_startup_delay_ms() -> u64 {
    200
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        if let Ok(url) = std::env::var("WASMWATCH_CACHE_URL") {
            config.cache_url = url;
        }
        Ok(config)
    }

    pub fn enabled_networks(&self) -> impl Iterator<Item = &NetworkConfig> {
        self.networks.iter().filter(|n| n.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_defaults() {
        let raw = r#"{
            "cache_url": "redis://127.0.0.1:6379",
            "networks": [
                {
                    "id": "osmosis-testnet",
                    "contract": "osmo1h6d53zdzp4dwqr742qvzlucafghuhus7653su0f8cfdfzzkww4as9389xs",
                    "rpc": "https://rpc.testnet.osmosis.zone:443"
                },
                {
                    "id": "local",
                    "contract": "osmo153r9tg33had5c5s54sqzn879xww2q2egektyqnpj6nwxt8wls70qxukxqg",
                    "rpc": "http://localhost:26657",
                    "enabled": false,
                    "strategy": "subscribe",
                    "poll_interval_ms": 1000
                }
            ]
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert!(!config.durable_cursor);
        assert_eq!(config.startup_delay_ms, 200);

        let first = &config.networks[0];
        assert!(first.enabled);
        assert_eq!(first.strategy, WatchStrategy::Poll);
        assert_eq!(first.poll_interval_ms, 5000);

        let second = &config.networks[1];
        assert!(!second.enabled);
        assert_eq!(second.strategy, WatchStrategy::Subscribe);
        assert_eq!(second.poll_interval_ms, 1000);

        assert_eq!(config.enabled_networks().count(), 1);
    }
}
