use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use log::{info, warn};
use threadpool::ThreadPool;

use crate::enzyme::Enzyme;
use crate::model::maintenance_information::PartitionBoundaries;
use crate::model::Protein;
use crate::store::{RetryDecision, RetryPolicy, Store};

use super::statistics::DigestionStatistics;
use super::worker::process_protein;

#[derive(Debug, Clone, Copy)]
pub struct DigestionConfig {
    pub number_of_threads: usize,
    pub retry_policy: RetryPolicy,
}

impl Default for DigestionConfig {
    fn default() -> Self {
        Self {
            number_of_threads: num_cpus::get(),
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// Runs the accession-lookup/merge/create loop across a [`threadpool::ThreadPool`]
/// of `number_of_threads` workers, one job per incoming protein. `stop_flag`
/// is checked before each job starts so a SIGINT/SIGTERM mid-run stops
/// queueing new work and returns once the in-flight jobs drain, rather than
/// working through the rest of `proteins`. Returns the run's statistics and
/// the proteins that could not be stored after the retry policy gave up on
/// them, ready for `Protein::to_fasta_entry`-based logging.
pub fn run_digestion(
    store: Arc<dyn Store + Send + Sync>,
    proteins: impl IntoIterator<Item = Protein>,
    enzyme: Arc<Enzyme>,
    boundaries: Arc<PartitionBoundaries>,
    stop_flag: Arc<AtomicBool>,
    config: DigestionConfig,
) -> (Arc<DigestionStatistics>, Vec<Protein>) {
    let statistics = Arc::new(DigestionStatistics::new());
    let number_of_threads = config.number_of_threads.max(1);
    let pool = ThreadPool::new(number_of_threads);
    let (unprocessible_tx, unprocessible_rx) = std::sync::mpsc::channel::<Protein>();

    info!("digestion worker pool started with {number_of_threads} threads");
    for protein in proteins {
        if stop_flag.load(Ordering::Relaxed) {
            info!("digestion stopping early: termination requested");
            break;
        }
        let store = Arc::clone(&store);
        let enzyme = Arc::clone(&enzyme);
        let boundaries = Arc::clone(&boundaries);
        let statistics = Arc::clone(&statistics);
        let unprocessible_tx = unprocessible_tx.clone();
        let retry_policy = config.retry_policy;
        pool.execute(move || {
            let mut counter = 0.0_f64;
            let mut retried_other = false;
            loop {
                match process_protein(store.as_ref(), &protein, &enzyme, &boundaries) {
                    Ok(outcome) => {
                        if outcome.created_protein {
                            statistics.created_proteins.fetch_add(1, Ordering::Relaxed);
                        }
                        statistics
                            .inserted_peptides
                            .fetch_add(outcome.inserted_peptides as u64, Ordering::Relaxed);
                        break;
                    }
                    Err(error) => {
                        let decision = retry_policy.classify(error.kind(), &mut counter, &mut retried_other);
                        match decision {
                            RetryDecision::RetryImmediately | RetryDecision::RetryOnceThenFail => continue,
                            RetryDecision::RetryAfter(duration) => {
                                thread::sleep(duration);
                                continue;
                            }
                            RetryDecision::Fatal => {
                                warn!("giving up on protein {}: {error}", protein.accession);
                                statistics.unprocessible_proteins.fetch_add(1, Ordering::Relaxed);
                                let _ = unprocessible_tx.send(protein.clone());
                                break;
                            }
                        }
                    }
                }
            }
        });
    }
    drop(unprocessible_tx);
    pool.join();
    info!("digestion worker pool is stopping");

    let unprocessible: Vec<Protein> = unprocessible_rx.try_iter().collect();
    (statistics, unprocessible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn leptin(accession: &str) -> Protein {
        Protein::new(
            accession.to_string(),
            Vec::new(),
            "LEP_HUMAN".to_string(),
            "Leptin".to_string(),
            "MDQTLAIYQQILASLPSR".to_string(),
            Some(9606),
            Some("UP000005640".to_string()),
            true,
            1,
        )
    }

    #[test]
    fn digests_a_batch_of_proteins_across_threads() {
        let store: Arc<dyn Store + Send + Sync> = Arc::new(MemoryStore::new());
        let enzyme = Arc::new(Enzyme::trypsin(2, 5, 50).unwrap());
        let boundaries = Arc::new(PartitionBoundaries {
            boundaries: vec![crate::model::maintenance_information::PartitionBoundary {
                partition: 0,
                lower: 0,
                upper: i64::MAX,
            }],
        });
        let proteins: Vec<Protein> = (0..20).map(|i| leptin(&format!("P{i}"))).collect();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let (statistics, unprocessible) = run_digestion(
            store,
            proteins,
            enzyme,
            boundaries,
            stop_flag,
            DigestionConfig {
                number_of_threads: 4,
                retry_policy: RetryPolicy::default(),
            },
        );
        assert!(unprocessible.is_empty());
        let (created, failed, _inserted) = statistics.snapshot();
        assert_eq!(created, 20);
        assert_eq!(failed, 0);
    }
}
