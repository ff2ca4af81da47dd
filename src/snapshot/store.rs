//! Shared snapshot cell.
//!
//! One writer publishes whole snapshots; readers load an `Arc` and see either
//! the previous or the next snapshot, never a partial one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use super::error::{SnapshotError, SnapshotResult};
use super::model::Snapshot;

#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: ArcSwapOption<Snapshot>,
    stale: AtomicBool,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot and clear the stale flag.
    pub fn publish(&self, snapshot: Snapshot) {
        self.current.store(Some(Arc::new(snapshot)));
        self.stale.store(false, Ordering::Release);
    }

    /// Latest snapshot, or [`SnapshotError::NotSubscribed`] before the first publish.
    pub fn load(&self) -> SnapshotResult<Arc<Snapshot>> {
        self.current.load_full().ok_or(SnapshotError::NotSubscribed)
    }

    pub fn is_ready(&self) -> bool {
        self.current.load().is_some()
    }

    /// Flag the current snapshot as possibly behind the ledger.
    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::model::fixtures::account_set;

    #[test]
    fn test_load_before_publish() {
        let store = SnapshotStore::new();
        assert!(matches!(store.load(), Err(SnapshotError::NotSubscribed)));
        assert!(!store.is_ready());
    }

    #[test]
    fn test_readers_keep_their_snapshot() {
        let store = SnapshotStore::new();
        let set = account_set();
        store.publish(set.to_snapshot(1));
        let held = store.load().unwrap();

        store.publish(set.to_snapshot(2));
        assert_eq!(held.slot, 1);
        assert_eq!(store.load().unwrap().slot, 2);
    }

    #[test]
    fn test_stale_flag_cleared_by_publish() {
        let store = SnapshotStore::new();
        store.publish(account_set().to_snapshot(1));
        store.mark_stale();
        assert!(store.is_stale());
        assert!(store.load().is_ok());

        store.publish(account_set().to_snapshot(2));
        assert!(!store.is_stale());
    }
}
