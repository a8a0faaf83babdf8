//! wasmwatch-rpc — Tendermint JSON-RPC transport for the watch pipeline.
//!
//! Implements `wasmwatch_core::ChainClient` over HTTP: `status` probe,
//! `block` head reads, `tx_search` activity probes, and CosmWasm smart
//! queries via `abci_query` with protobuf framing.

pub mod client;
pub mod proto;
pub mod wire;

pub use client::{HttpChainClient, HttpClientConfig};
pub use wire::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId};
