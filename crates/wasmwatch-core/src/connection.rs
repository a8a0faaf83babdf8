//! Per-network connection state machine.
//!
//! Replaces the "retry by re-invoking connect from a timer" pattern with an
//! explicit `Disconnected → Connecting → Ready` machine that retries
//! indefinitely and flips back to `Connecting` when a query reports
//! transport loss. Readiness is single-resolution: the first successful
//! connect resolves `ready()` permanently, so callers that already awaited
//! it never re-await across later reconnects.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{watch, Notify};

use crate::chain::ChainClient;
use crate::error::WatchError;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and no attempt in flight.
    Disconnected,
    /// A connect attempt is in flight (or waiting out a backoff delay).
    Connecting,
    /// The endpoint answered the probe; queries are allowed.
    Ready,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

/// Reconnect backoff policy.
///
/// The default matches the historical fixed 3-second delay (no growth);
/// set `multiplier > 1.0` for exponential backoff capped at `max`.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the first retry.
    pub initial: Duration,
    /// Upper bound on the delay.
    pub max: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(3),
            max: Duration::from_secs(3),
            multiplier: 1.0,
        }
    }
}

impl BackoffConfig {
    /// Returns the delay that follows `current`.
    pub fn next(&self, current: Duration) -> Duration {
        current.mul_f64(self.multiplier.max(1.0)).min(self.max)
    }
}

struct Inner<C> {
    network_id: String,
    client: C,
    state: watch::Sender<ConnectionState>,
    ready: watch::Sender<bool>,
    lost: Notify,
    backoff: BackoffConfig,
}

/// Handle to one network's connection.
///
/// Cheap to clone; all clones share the same state machine. At most one
/// connect attempt is in flight per network at any time (the single
/// spawned `connect_loop` owns reconnection).
pub struct ChainConnection<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for ChainConnection<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: ChainClient> ChainConnection<C> {
    /// Create the connection and eagerly start its connect loop.
    pub fn start(network_id: impl Into<String>, client: C, backoff: BackoffConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (ready, _) = watch::channel(false);
        let inner = Arc::new(Inner {
            network_id: network_id.into(),
            client,
            state,
            ready,
            lost: Notify::new(),
            backoff,
        });
        let task = Arc::clone(&inner);
        tokio::spawn(connect_loop(task));
        Self { inner }
    }

    /// Borrow the underlying client (bypasses the readiness guard).
    pub fn client(&self) -> &C {
        &self.inner.client
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Subscribe to state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Returns `true` once the endpoint has been probed successfully.
    pub fn is_ready(&self) -> bool {
        self.state() == ConnectionState::Ready
    }

    /// Resolves after the first successful connect. Later transient
    /// disconnects do not reset it.
    pub async fn ready(&self) {
        let mut rx = self.inner.ready.subscribe();
        // The sender lives in `inner`, which we hold, so this cannot fail.
        let _ = rx.wait_for(|r| *r).await;
    }

    /// Latest block height at the chain head.
    pub async fn latest_height(&self) -> Result<u64, WatchError> {
        self.guard()?;
        self.track(self.inner.client.latest_height().await)
    }

    /// Number of transactions at `height` touching `contract`.
    pub async fn contract_tx_count(&self, contract: &str, height: u64) -> Result<u64, WatchError> {
        self.guard()?;
        self.track(self.inner.client.contract_tx_count(contract, height).await)
    }

    /// Read-only smart query against `contract`.
    pub async fn smart_query(&self, contract: &str, msg: &Value) -> Result<Value, WatchError> {
        self.guard()?;
        self.track(self.inner.client.smart_query(contract, msg).await)
    }

    fn guard(&self) -> Result<(), WatchError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(WatchError::NotReady {
                network: self.inner.network_id.clone(),
            })
        }
    }

    /// Pass a query result through, reporting transport loss on transient errors.
    fn track<T>(&self, result: Result<T, WatchError>) -> Result<T, WatchError> {
        if let Err(e) = &result {
            if matches!(e, WatchError::Rpc(_)) {
                self.report_loss();
            }
        }
        result
    }

    /// Flip `Ready → Disconnected` and wake the connect loop.
    /// Only the first reporter triggers a reconnect cycle.
    fn report_loss(&self) {
        let flipped = self.inner.state.send_if_modified(|s| {
            if *s == ConnectionState::Ready {
                *s = ConnectionState::Disconnected;
                true
            } else {
                false
            }
        });
        if flipped {
            self.inner.lost.notify_one();
        }
    }
}

async fn connect_loop<C: ChainClient>(inner: Arc<Inner<C>>) {
    loop {
        inner.state.send_replace(ConnectionState::Connecting);
        let mut delay = inner.backoff.initial;

        loop {
            match inner.client.status().await {
                Ok(()) => break,
                Err(e) => {
                    tracing::warn!(
                        network = %inner.network_id,
                        error = %e,
                        "connect failed, retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                    delay = inner.backoff.next(delay);
                }
            }
        }

        inner.state.send_replace(ConnectionState::Ready);
        inner.ready.send_replace(true);
        tracing::info!(network = %inner.network_id, "connected");

        // Park until a query reports transport loss.
        inner.lost.notified().await;
        tracing::warn!(network = %inner.network_id, "transport lost, reconnecting");
    }
}
