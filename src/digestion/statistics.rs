use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters a digestion run updates as it goes, snapshotted
/// periodically by the statistics logger.
#[derive(Debug, Default)]
pub struct DigestionStatistics {
    pub created_proteins: AtomicU64,
    pub unprocessible_proteins: AtomicU64,
    pub inserted_peptides: AtomicU64,
}

impl DigestionStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.created_proteins.load(Ordering::Relaxed),
            self.unprocessible_proteins.load(Ordering::Relaxed),
            self.inserted_peptides.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let stats = DigestionStatistics::new();
        stats.created_proteins.fetch_add(3, Ordering::Relaxed);
        stats.inserted_peptides.fetch_add(42, Ordering::Relaxed);
        assert_eq!(stats.snapshot(), (3, 0, 42));
    }
}
