//! Protobuf envelopes for `cosmwasm.wasm.v1` smart queries.
//!
//! Only the two messages the `/cosmwasm.wasm.v1.Query/SmartContractState`
//! ABCI path needs; written in the prost-generated idiom rather than
//! pulling in the full chain proto tree.

/// QuerySmartContractStateRequest is the request type for the
/// Query/SmartContractState RPC method.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QuerySmartContractStateRequest {
    /// address is the address of the contract.
    #[prost(string, tag = "1")]
    pub address: ::prost::alloc::string::String,
    /// QueryData contains the query data passed to the contract.
    #[prost(bytes = "vec", tag = "2")]
    pub query_data: ::prost::alloc::vec::Vec<u8>,
}

/// QuerySmartContractStateResponse is the response type for the
/// Query/SmartContractState RPC method.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QuerySmartContractStateResponse {
    /// Data contains the json data returned from the smart contract.
    #[prost(bytes = "vec", tag = "1")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}

/// ABCI query path for smart contract state.
pub const SMART_QUERY_PATH: &str = "/cosmwasm.wasm.v1.Query/SmartContractState";
