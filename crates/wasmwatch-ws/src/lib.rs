//! wasmwatch-ws — subscription-based event watcher over Tendermint WebSocket.

pub mod watcher;

pub use watcher::{SubscriptionWatcher, WsConfig};
