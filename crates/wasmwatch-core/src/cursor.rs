//! Per-network sync cursor — the last height handed to a sync attempt.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically non-decreasing height cursor.
///
/// The cursor is advanced *before* a sync for the accepted height begins,
/// so duplicate or stale notifications arriving during the fetch are
/// rejected. In-memory only by default; it resets to zero on restart
/// unless seeded from the cache (durable-cursor mode).
#[derive(Debug, Default)]
pub struct SyncCursor(AtomicU64);

impl SyncCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cursor value.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Accept `height` if it is strictly greater than every previously
    /// accepted height, advancing the cursor atomically. Returns `true`
    /// if accepted.
    pub fn try_advance(&self, height: u64) -> bool {
        self.0.fetch_max(height, Ordering::SeqCst) < height
    }

    /// Seed the cursor at startup (durable-cursor read-back). Never moves
    /// the cursor backwards.
    pub fn seed(&self, height: u64) {
        self.0.fetch_max(height, Ordering::SeqCst);
    }
}
