use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counter for the metadata collector's total updated peptides,
/// snapshotted periodically by the statistics logger.
#[derive(Debug, Default)]
pub struct MetadataStatistics {
    pub updated_peptides: AtomicU64,
}

impl MetadataStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> u64 {
        self.updated_peptides.load(Ordering::Relaxed)
    }
}
