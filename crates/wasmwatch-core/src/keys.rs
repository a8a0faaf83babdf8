//! Cache key schema.
//!
//! Downstream readers depend on these exact names; change them and every
//! consumer breaks. Per network id `N` and user address `U`:
//!
//! | key                  | value                                   |
//! |----------------------|-----------------------------------------|
//! | `{N}-state`          | full contract state JSON                |
//! | `{N}-batches`        | the batch *array* JSON (not the wrapper)|
//! | `{N}-claimable-{U}`  | batch ids with an unredeemed request    |
//! | `{N}-updated`        | ms epoch string, written last           |
//! | `{N}-height`         | durable cursor (opt-in)                 |

pub fn state(network_id: &str) -> String {
    format!("{network_id}-state")
}

pub fn batches(network_id: &str) -> String {
    format!("{network_id}-batches")
}

pub fn claimable(network_id: &str, user: &str) -> String {
    format!("{network_id}-claimable-{user}")
}

pub fn updated(network_id: &str) -> String {
    format!("{network_id}-updated")
}

pub fn height(network_id: &str) -> String {
    format!("{network_id}-height")
}

#[cfg(test)]
mod tests {
    #[test]
    fn key_schema() {
        assert_eq!(super::state("osmosis"), "osmosis-state");
        assert_eq!(super::batches("osmosis"), "osmosis-batches");
        assert_eq!(
            super::claimable("osmosis", "osmo1abc"),
            "osmosis-claimable-osmo1abc"
        );
        assert_eq!(super::updated("osmosis"), "osmosis-updated");
        assert_eq!(super::height("osmosis"), "osmosis-height");
    }
}
