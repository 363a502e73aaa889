//! Ordered store: the single active snapshot shared by readers and the reload loop.
//!
//! The active snapshot sits behind an `ArcSwap`:
//! - readers load the current `Arc` lock-free and run against that pinned,
//!   immutable table; they never observe a half-built one;
//! - `install` swaps one pointer, so readers are never held up for longer
//!   than that;
//! - a reader still holding the previous `Arc` keeps it alive until it is
//!   done, after which it is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::record::Record;
use crate::snapshot::Snapshot;

pub struct Store {
    active: ArcSwap<Snapshot>,
    installs: AtomicU64,
}

impl Store {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            active: ArcSwap::from_pointee(initial),
            installs: AtomicU64::new(0),
        }
    }

    /// Pin the current snapshot. Stays valid across later installs.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.active.load_full()
    }

    pub fn get(&self, key: &[u32]) -> Option<Record> {
        self.active.load().get(key).cloned()
    }

    pub fn get_next(&self, key: &[u32]) -> Option<Record> {
        self.active.load().get_next(key).cloned()
    }

    /// Replace the active snapshot; returns the one it replaced.
    pub fn install(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        self.install_arc(Arc::new(snapshot))
    }

    pub fn install_arc(&self, snapshot: Arc<Snapshot>) -> Arc<Snapshot> {
        let prev = self.active.swap(snapshot);
        self.installs.fetch_add(1, Ordering::Release);
        prev
    }

    /// Number of installs since construction.
    pub fn installs(&self) -> u64 {
        self.installs.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.active.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.load().is_empty()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Snapshot::empty())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("records", &self.len())
            .field("installs", &self.installs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use crate::record::Value;

    fn snap(entries: &[(&[u32], i32)]) -> Snapshot {
        Snapshot::from_records(
            entries
                .iter()
                .map(|(k, v)| Record::new(Key::new(k).unwrap(), Value::Integer32(*v))),
        )
    }

    #[test]
    fn default_store_is_empty() {
        let s = Store::default();
        assert!(s.is_empty());
        assert!(s.get(&[1]).is_none());
        assert!(s.get_next(&[]).is_none());
        assert_eq!(s.installs(), 0);
    }

    #[test]
    fn install_replaces_whole_table() {
        let s = Store::new(snap(&[(&[1], 1), (&[2], 2)]));
        assert_eq!(s.get(&[2]).unwrap().value, Value::Integer32(2));

        let prev = s.install(snap(&[(&[3], 3)]));
        assert_eq!(prev.len(), 2);
        assert_eq!(s.installs(), 1);
        assert!(s.get(&[2]).is_none());
        assert_eq!(s.get_next(&[]).unwrap().value, Value::Integer32(3));
    }

    #[test]
    fn pinned_snapshot_survives_install() {
        let s = Store::new(snap(&[(&[1], 10)]));
        let pinned = s.snapshot();
        s.install(snap(&[(&[1], 20)]));

        assert_eq!(pinned.get(&[1]).unwrap().value, Value::Integer32(10));
        assert_eq!(s.get(&[1]).unwrap().value, Value::Integer32(20));
    }
}
