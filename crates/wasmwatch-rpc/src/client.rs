//! HTTP `ChainClient` backed by a Tendermint JSON-RPC endpoint.
//!
//! Uses `status` as the connection probe, `block` for the head height,
//! `tx_search` as the contract-activity probe, and `abci_query` with the
//! CosmWasm smart-query path for contract reads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use prost::Message as _;
use serde_json::{json, Map, Value};

use wasmwatch_core::{ChainClient, WatchError};

use crate::proto::{
    QuerySmartContractStateRequest, QuerySmartContractStateResponse, SMART_QUERY_PATH,
};
use crate::wire::{params, JsonRpcRequest, JsonRpcResponse};

/// Configuration for `HttpChainClient`.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub request_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Tendermint JSON-RPC client for one endpoint.
pub struct HttpChainClient {
    url: String,
    http: reqwest::Client,
    req_id: AtomicU64,
}

impl HttpChainClient {
    pub fn new(url: impl Into<String>, config: HttpClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("failed to build reqwest client");
        Self {
            url: url.into(),
            http,
            req_id: AtomicU64::new(1),
        }
    }

    /// Create with default configuration.
    pub fn default_for(url: impl Into<String>) -> Self {
        Self::new(url, HttpClientConfig::default())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, method: &str, params: Map<String, Value>) -> Result<Value, WatchError> {
        let req = JsonRpcRequest::new(self.req_id.fetch_add(1, Ordering::Relaxed), method, params);
        tracing::debug!(method, url = %self.url, "sending rpc request");
        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| WatchError::Rpc(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(WatchError::Rpc(format!("HTTP {status}: {body}")));
        }

        let resp: JsonRpcResponse = resp
            .json()
            .await
            .map_err(|e| WatchError::Rpc(e.to_string()))?;
        // The node answered; an error object is a rejected query, not transport loss.
        resp.into_result()
            .map_err(|e| WatchError::Query(e.to_string()))
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn status(&self) -> Result<(), WatchError> {
        self.call("status", Map::new()).await.map(|_| ())
    }

    async fn latest_height(&self) -> Result<u64, WatchError> {
        let result = self.call("block", Map::new()).await?;
        parse_block_height(&result)
    }

    async fn contract_tx_count(&self, contract: &str, height: u64) -> Result<u64, WatchError> {
        let result = self
            .call(
                "tx_search",
                params(&[
                    ("query", json!(contract_tx_query(contract, height))),
                    ("prove", json!(false)),
                    ("page", json!("1")),
                    ("per_page", json!("1")),
                    ("order_by", json!("asc")),
                ]),
            )
            .await?;
        parse_total_count(&result)
    }

    async fn smart_query(&self, contract: &str, msg: &Value) -> Result<Value, WatchError> {
        let envelope = QuerySmartContractStateRequest {
            address: contract.to_string(),
            query_data: serde_json::to_vec(msg)?,
        };
        let result = self
            .call(
                "abci_query",
                params(&[
                    ("path", json!(SMART_QUERY_PATH)),
                    ("data", json!(hex::encode(envelope.encode_to_vec()))),
                    ("height", json!("0")),
                    ("prove", json!(false)),
                ]),
            )
            .await?;
        decode_smart_response(&result)
    }
}

/// Tendermint event query matching transactions that touched `contract`
/// at exactly `height`.
pub fn contract_tx_query(contract: &str, height: u64) -> String {
    format!("wasm._contract_address='{contract}' AND tx.height={height}")
}

/// Pull the header height out of a `block` response.
pub fn parse_block_height(result: &Value) -> Result<u64, WatchError> {
    result["block"]["header"]["height"]
        .as_str()
        .and_then(|h| h.parse().ok())
        .ok_or_else(|| WatchError::Query("malformed block response: missing header height".into()))
}

/// Pull `total_count` out of a `tx_search` response.
pub fn parse_total_count(result: &Value) -> Result<u64, WatchError> {
    result["total_count"]
        .as_str()
        .and_then(|c| c.parse().ok())
        .ok_or_else(|| WatchError::Query("malformed tx_search response: missing total_count".into()))
}

/// Unwrap an `abci_query` response into the contract's JSON.
pub fn decode_smart_response(result: &Value) -> Result<Value, WatchError> {
    let response = &result["response"];
    let code = response["code"].as_u64().unwrap_or(0);
    if code != 0 {
        let log = response["log"].as_str().unwrap_or("");
        return Err(WatchError::Query(format!("abci code {code}: {log}")));
    }
    let value = response["value"]
        .as_str()
        .ok_or_else(|| WatchError::Query("malformed abci_query response: missing value".into()))?;
    let bytes = BASE64
        .decode(value)
        .map_err(|e| WatchError::Query(format!("invalid abci value encoding: {e}")))?;
    let decoded = QuerySmartContractStateResponse::decode(bytes.as_slice())
        .map_err(|e| WatchError::Query(format!("invalid smart query envelope: {e}")))?;
    Ok(serde_json::from_slice(&decoded.data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message as _;

    #[test]
    fn tx_query_format() {
        assert_eq!(
            contract_tx_query("osmo1abc", 712),
            "wasm._contract_address='osmo1abc' AND tx.height=712"
        );
    }

    #[test]
    fn block_height_from_header() {
        let result = json!({
            "block_id": { "hash": "AA" },
            "block": { "header": { "chain_id": "osmosis-1", "height": "12931271" } }
        });
        assert_eq!(parse_block_height(&result).unwrap(), 12_931_271);

        let bad = json!({ "block": { "header": {} } });
        assert!(matches!(
            parse_block_height(&bad),
            Err(WatchError::Query(_))
        ));
    }

    #[test]
    fn total_count_from_tx_search() {
        let result = json!({ "txs": [{}], "total_count": "3" });
        assert_eq!(parse_total_count(&result).unwrap(), 3);
        assert_eq!(
            parse_total_count(&json!({ "txs": [], "total_count": "0" })).unwrap(),
            0
        );
    }

    #[test]
    fn smart_response_decodes_contract_json() {
        // A QuerySmartContractStateResponse carrying `{"total":"5"}`.
        let envelope = QuerySmartContractStateResponse {
            data: br#"{"total":"5"}"#.to_vec(),
        };
        let result = json!({
            "response": { "code": 0, "value": BASE64.encode(envelope.encode_to_vec()) }
        });
        let value = decode_smart_response(&result).unwrap();
        assert_eq!(value["total"], "5");
    }

    #[test]
    fn smart_response_surfaces_abci_error() {
        let result = json!({
            "response": { "code": 18, "log": "query wasm contract failed: unknown variant" }
        });
        let err = decode_smart_response(&result).unwrap_err();
        assert!(matches!(err, WatchError::Query(_)));
        assert!(err.to_string().contains("unknown variant"));
    }
}
