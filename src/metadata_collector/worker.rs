use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;
use threadpool::ThreadPool;

use crate::model::peptide_metadata::ContainingProteinFacts;
use crate::model::{Peptide, PeptideMetadata};
use crate::store::Store;

use super::statistics::MetadataStatistics;

const BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy)]
pub struct MetadataCollectionConfig {
    pub number_of_threads: usize,
}

impl Default for MetadataCollectionConfig {
    fn default() -> Self {
        Self {
            number_of_threads: num_cpus::get(),
        }
    }
}

/// Streams every peptide flagged `metadata_up_to_date = false` in batches of
/// [`BATCH_SIZE`], fans them out to a worker pool that recomputes each
/// peptide's metadata from its containing proteins, and flips the flag back
/// once stored.
pub fn run_metadata_collection(
    store: Arc<dyn Store + Send + Sync>,
    stop_flag: Arc<AtomicBool>,
    config: MetadataCollectionConfig,
) -> Arc<MetadataStatistics> {
    let statistics = Arc::new(MetadataStatistics::new());
    let number_of_threads = config.number_of_threads.max(1);
    let pool = ThreadPool::new(number_of_threads);

    info!("metadata update worker pool started with {number_of_threads} threads");
    let mut cursor = None;
    loop {
        if stop_flag.load(Ordering::Relaxed) {
            info!("metadata collection stopping early: termination requested");
            break;
        }
        let batch = match store.select_stale_peptide_batch(BATCH_SIZE, cursor.clone()) {
            Ok(batch) => batch,
            Err(_) => break,
        };
        if batch.is_empty() {
            break;
        }
        cursor = batch.last().map(|p| (p.partition, p.mass, p.sequence.clone()));

        let store = Arc::clone(&store);
        let statistics = Arc::clone(&statistics);
        pool.execute(move || {
            for peptide in &batch {
                if update_one(store.as_ref(), peptide).is_ok() {
                    statistics.updated_peptides.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
    }
    pool.join();
    info!("metadata update worker pool is stopping");

    statistics
}

fn update_one(store: &dyn Store, peptide: &Peptide) -> Result<(), crate::store::StoreError> {
    let proteins = store.proteins_containing_peptide(peptide.partition, peptide.mass, &peptide.sequence)?;
    let facts: Vec<ContainingProteinFacts> = proteins
        .iter()
        .map(|protein| ContainingProteinFacts {
            is_reviewed: protein.is_reviewed,
            taxonomy_id: protein.taxonomy_id,
            proteome_id: protein.proteome_id.clone(),
        })
        .collect();
    let metadata = PeptideMetadata::compute(&facts);
    store.apply_peptide_metadata_update(peptide.partition, peptide.mass, &peptide.sequence, &metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Protein;
    use crate::store::MemoryStore;

    #[test]
    fn marks_stale_peptides_fresh_after_collecting_metadata() {
        let store = Arc::new(MemoryStore::new());
        let peptide = Peptide::new("MR".to_string(), 0, 0);
        store.bulk_insert_peptides(&[peptide.clone()]).unwrap();
        store
            .flag_peptides_stale(&[(peptide.partition, peptide.mass, peptide.sequence.clone())])
            .unwrap();
        let protein = Protein::new(
            "P1".to_string(),
            Vec::new(),
            "LEP_HUMAN".to_string(),
            "Leptin".to_string(),
            "MR".to_string(),
            Some(9606),
            None,
            true,
            1,
        );
        store.insert_protein(&protein).unwrap();
        store
            .bulk_insert_associations(&[crate::model::ProteinPeptideAssociation::new(
                "P1".to_string(),
                peptide.partition,
                peptide.mass,
                peptide.sequence.clone(),
            )])
            .unwrap();

        let stop_flag = Arc::new(AtomicBool::new(false));
        let statistics = run_metadata_collection(store.clone(), stop_flag, MetadataCollectionConfig { number_of_threads: 2 });
        assert_eq!(statistics.snapshot(), 1);
        assert!(store.select_stale_peptide_batch(10, None).unwrap().is_empty());
    }
}
