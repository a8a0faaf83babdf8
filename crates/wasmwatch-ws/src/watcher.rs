//! Subscription watcher strategy.
//!
//! Opens a persistent WebSocket to the node's event-subscription
//! interface, subscribes to transactions touching the watched contract,
//! and forwards each pushed height immediately. On transport loss it
//! resubscribes after a fixed backoff, indefinitely. On shutdown it sends
//! a best-effort `unsubscribe` before closing.
//!
//! Heights are forwarded as the node pushes them; under network
//! reordering they may arrive out of order, which the sync engine's
//! cursor guard absorbs.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;

use wasmwatch_core::Network;

#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Delay before reconnect + resubscribe after transport loss.
    pub resubscribe_backoff: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            resubscribe_backoff: Duration::from_secs(3),
        }
    }
}

/// Subscription-based event watcher for one network.
///
/// Owns its own socket; no shared process-wide connection state.
pub struct SubscriptionWatcher {
    network: Network,
    config: WsConfig,
}

impl SubscriptionWatcher {
    pub fn new(network: Network, config: WsConfig) -> Self {
        Self { network, config }
    }

    /// Watch until shutdown is signalled or the receiving side of
    /// `heights` goes away.
    pub async fn run(self, heights: mpsc::UnboundedSender<u64>, mut shutdown: watch::Receiver<bool>) {
        let url = websocket_url(&self.network.rpc);

        loop {
            tracing::info!(network = %self.network.id, url = %url, "connecting subscription watcher");

            let stream = tokio::select! {
                conn = tokio_tungstenite::connect_async(&url) => match conn {
                    Ok((stream, _)) => stream,
                    Err(e) => {
                        tracing::warn!(
                            network = %self.network.id,
                            error = %e,
                            "WS connect failed, retrying in {:?}",
                            self.config.resubscribe_backoff
                        );
                        if self.pause_or_shutdown(&mut shutdown).await {
                            return;
                        }
                        continue;
                    }
                },
                _ = shutdown_signalled(&mut shutdown) => return,
            };

            let (mut sink, mut source) = stream.split();

            let subscribe = subscribe_request(&self.network.contract);
            if sink.send(Message::Text(subscribe.to_string().into())).await.is_err() {
                if self.pause_or_shutdown(&mut shutdown).await {
                    return;
                }
                continue;
            }
            tracing::info!(network = %self.network.id, "subscribed to contract events");

            loop {
                tokio::select! {
                    msg = source.next() => match msg {
                        None => break,
                        Some(Err(e)) => {
                            tracing::warn!(network = %self.network.id, error = %e, "WS receive error");
                            break;
                        }
                        Some(Ok(Message::Text(text))) => {
                            let Ok(event) = serde_json::from_str::<Value>(&text) else {
                                tracing::debug!(network = %self.network.id, "unparseable WS message");
                                continue;
                            };
                            if let Some(height) = extract_height(&event) {
                                tracing::info!(network = %self.network.id, height, "relevant block detected");
                                if heights.send(height).is_err() {
                                    return;
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) => break,
                        Some(Ok(_)) => {}
                    },
                    _ = shutdown_signalled(&mut shutdown) => {
                        // Best-effort unsubscribe before the process exits.
                        let unsubscribe = unsubscribe_request(&self.network.contract);
                        let _ = sink.send(Message::Text(unsubscribe.to_string().into())).await;
                        let _ = sink.send(Message::Close(None)).await;
                        tracing::info!(network = %self.network.id, "unsubscribed, watcher stopped");
                        return;
                    }
                }
            }

            tracing::warn!(
                network = %self.network.id,
                "WS disconnected, resubscribing in {:?}",
                self.config.resubscribe_backoff
            );
            if self.pause_or_shutdown(&mut shutdown).await {
                return;
            }
        }
    }

    /// Sleep out the backoff; returns `true` if shutdown arrived instead.
    async fn pause_or_shutdown(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(self.config.resubscribe_backoff) => false,
            _ = shutdown_signalled(shutdown) => true,
        }
    }
}

async fn shutdown_signalled(shutdown: &mut watch::Receiver<bool>) {
    if *shutdown.borrow() {
        return;
    }
    // A dropped sender counts as shutdown.
    while shutdown.changed().await.is_ok() {
        if *shutdown.borrow() {
            return;
        }
    }
}

/// Tendermint event query for the watched contract.
pub fn contract_event_query(contract: &str) -> String {
    format!("wasm._contract_address = '{contract}'")
}

/// The subscribe envelope sent on connect.
pub fn subscribe_request(contract: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "subscribe",
        "id": 1,
        "params": { "query": contract_event_query(contract) }
    })
}

/// The unsubscribe envelope sent on shutdown, mirroring the subscribe.
pub fn unsubscribe_request(contract: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "unsubscribe",
        "id": 1,
        "params": { "query": contract_event_query(contract) }
    })
}

/// Pull the transaction height out of a pushed subscription event.
/// Returns `None` for non-Tx messages (e.g. the subscribe confirmation).
pub fn extract_height(event: &Value) -> Option<u64> {
    let height = &event["result"]["data"]["value"]["TxResult"]["height"];
    height
        .as_str()
        .and_then(|h| h.parse().ok())
        .or_else(|| height.as_u64())
}

/// Derive the WebSocket endpoint from the RPC URL.
pub fn websocket_url(rpc: &str) -> String {
    let base = rpc.trim_end_matches('/');
    let ws = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{ws}/websocket")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn websocket_url_schemes() {
        assert_eq!(
            websocket_url("https://rpc.testnet.osmosis.zone:443"),
            "wss://rpc.testnet.osmosis.zone:443/websocket"
        );
        assert_eq!(
            websocket_url("http://localhost:26657/"),
            "ws://localhost:26657/websocket"
        );
    }

    #[test]
    fn subscribe_envelope_shape() {
        let req = subscribe_request("osmo1abc");
        assert_eq!(req["method"], "subscribe");
        assert_eq!(
            req["params"]["query"],
            "wasm._contract_address = 'osmo1abc'"
        );

        let unsub = unsubscribe_request("osmo1abc");
        assert_eq!(unsub["method"], "unsubscribe");
        assert_eq!(unsub["params"]["query"], req["params"]["query"]);
    }

    #[test]
    fn height_from_tx_result_event() {
        let event = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "query": "wasm._contract_address = 'osmo1abc'",
                "data": {
                    "type": "tendermint/event/Tx",
                    "value": { "TxResult": { "height": "12931271", "tx": "CpMB..." } }
                }
            }
        });
        assert_eq!(extract_height(&event), Some(12_931_271));
    }

    #[test]
    fn subscribe_confirmation_has_no_height() {
        // The node confirms a subscription with an empty result.
        let event = json!({ "jsonrpc": "2.0", "id": 1, "result": {} });
        assert_eq!(extract_height(&event), None);
    }
}
