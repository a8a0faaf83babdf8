//! Batch shapes and the claimable-by-user index derivation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single user's claim entry within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub user: String,
    pub redeemed: bool,
}

/// A contract-defined grouping of claim requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: u64,
    #[serde(default)]
    pub requests: Vec<BatchRequest>,
}

/// Response shape of the `{"batches": {}}` smart query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchList {
    #[serde(default)]
    pub batches: Vec<Batch>,
}

/// Mapping from user to the batch ids holding at least one of that user's
/// unredeemed requests.
///
/// Rebuilt in full on every sync — incremental updates would leave stale
/// entries behind when a request flips from unredeemed to redeemed.
/// `BTreeMap` keeps iteration (and therefore cache write order)
/// deterministic, which makes re-syncing the same fetched state idempotent.
pub type ClaimableIndex = BTreeMap<String, Vec<u64>>;

/// Derive the claimable index from a batch list.
///
/// O(total requests across all batches); syncs are rate-limited by the
/// watcher's notification cadence, not by request volume.
pub fn claimable_index(batches: &[Batch]) -> ClaimableIndex {
    let mut index = ClaimableIndex::new();
    for batch in batches {
        for request in &batch.requests {
            if !request.redeemed {
                let ids = index.entry(request.user.clone()).or_default();
                // A batch id is a set member: multiple unredeemed requests
                // by one user in the same batch contribute it once.
                if ids.last() != Some(&batch.id) {
                    ids.push(batch.id);
                }
            }
        }
    }
    index
}
