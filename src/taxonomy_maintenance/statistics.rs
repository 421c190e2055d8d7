use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters a taxonomy maintenance run updates as it goes.
#[derive(Debug, Default)]
pub struct TaxonomyMaintenanceStatistics {
    pub inserted_taxonomies: AtomicU64,
    pub inserted_merges: AtomicU64,
    pub deleted_taxonomies: AtomicU64,
}

impl TaxonomyMaintenanceStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.inserted_taxonomies.load(Ordering::Relaxed),
            self.inserted_merges.load(Ordering::Relaxed),
            self.deleted_taxonomies.load(Ordering::Relaxed),
        )
    }
}
