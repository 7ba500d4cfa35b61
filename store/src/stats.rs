//! Single-slot memo for catalog statistics.
//!
//! The snapshot is keyed by the store's [`StoreMarker`]. A request whose
//! marker matches the cached one is answered without touching the document
//! content; any other request rereads the store and replaces the slot.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use catalog_protocol::Stats;

use crate::persistence::ItemStore;
use crate::persistence::StoreError;
use crate::persistence::StoreMarker;

struct Snapshot {
    marker: StoreMarker,
    stats: Arc<Stats>,
}

pub struct StatsCache {
    store: Arc<ItemStore>,
    /// Held across recomputation, so concurrent stale readers wait for the
    /// first one instead of each rereading the file.
    slot: Mutex<Option<Snapshot>>,
    recomputations: AtomicU64,
}

impl StatsCache {
    pub fn new(store: Arc<ItemStore>) -> Self {
        Self {
            store,
            slot: Mutex::new(None),
            recomputations: AtomicU64::new(0),
        }
    }

    /// Return the cached snapshot, recomputing it when the store changed.
    pub fn get(&self) -> Result<Arc<Stats>, StoreError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        // Marker first: a write racing the read below only costs one extra
        // recomputation on the next call.
        let marker = self.store.marker()?;
        if let Some(snapshot) = slot.as_ref().filter(|s| s.marker == marker) {
            return Ok(Arc::clone(&snapshot.stats));
        }

        let items = self.store.read()?;
        let stats = Arc::new(Stats::from_items(&items));
        self.recomputations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "recomputed stats: {} items in {} categories",
            stats.total,
            stats.by_category.len()
        );

        *slot = Some(Snapshot {
            marker,
            stats: Arc::clone(&stats),
        });
        Ok(stats)
    }

    /// Whether a snapshot exists and still matches the store.
    pub fn is_fresh(&self) -> bool {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match (slot.as_ref(), self.store.marker()) {
            (Some(snapshot), Ok(marker)) => snapshot.marker == marker,
            _ => false,
        }
    }

    /// How many times the snapshot has been rebuilt from disk.
    pub fn recomputations(&self) -> u64 {
        self.recomputations.load(Ordering::Relaxed)
    }
}
