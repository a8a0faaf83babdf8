//! wasmwatch-core — change-detection and cache-sync pipeline for CosmWasm contracts.
//!
//! # Architecture
//!
//! ```text
//! NetworkRegistry ── one per process
//!      └── per network:
//!          ChainConnection  (Disconnected → Connecting → Ready, retries forever)
//!              ├── PollWatcher / SubscriptionWatcher  (emit qualifying heights)
//!              └── SyncEngine
//!                      ├── SyncCursor     (monotonic height guard)
//!                      ├── claimable_index (per-user derived index)
//!                      └── CacheStore     (Redis / memory backend)
//! ```
//!
//! Networks run as independent Tokio tasks; a dead endpoint on one network
//! never delays cache updates for another.

pub mod cache;
pub mod chain;
pub mod connection;
pub mod cursor;
pub mod error;
pub mod index;
pub mod keys;
pub mod network;
pub mod poll;
pub mod sync;

pub use cache::CacheStore;
pub use chain::ChainClient;
pub use connection::{BackoffConfig, ChainConnection, ConnectionState};
pub use cursor::SyncCursor;
pub use error::WatchError;
pub use index::{claimable_index, Batch, BatchList, BatchRequest, ClaimableIndex};
pub use network::{Network, NetworkEntry, NetworkRegistry};
pub use poll::{PollConfig, PollWatcher};
pub use sync::{SyncConfig, SyncEngine};
