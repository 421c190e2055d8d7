use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{info, warn};
use rand::Rng;
use threadpool::ThreadPool;

use crate::error::Result;
use crate::model::Taxonomy;
use crate::store::Store;
use crate::taxonomy_reader::{parse_delete_line, parse_merge_line, parse_name_line, parse_node_line};

use super::statistics::TaxonomyMaintenanceStatistics;

const CHUNK_SIZE: usize = 1000;
const MAX_COMMIT_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct TaxonomyMaintenanceConfig {
    pub number_of_threads: usize,
}

impl Default for TaxonomyMaintenanceConfig {
    fn default() -> Self {
        Self {
            number_of_threads: num_cpus::get(),
        }
    }
}

/// The NCBI `taxdump` files a maintenance run looks for under a work
/// directory, each optional: a run with only `nodes.dmp`/`names.dmp` still
/// builds the tree, it just skips the merge and delete stages.
#[derive(Debug, Clone)]
pub struct TaxonomyDumpPaths {
    pub nodes: PathBuf,
    pub names: PathBuf,
    pub merged: PathBuf,
    pub deleted: PathBuf,
}

impl TaxonomyDumpPaths {
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            nodes: dir.join("nodes.dmp"),
            names: dir.join("names.dmp"),
            merged: dir.join("merged.dmp"),
            deleted: dir.join("delnodes.dmp"),
        }
    }
}

/// Runs the taxonomy dump ingest end to end: builds nodes from
/// `nodes.dmp`/`names.dmp`, applies `merged.dmp`, then applies
/// `delnodes.dmp`. Each stage is skipped if its dump file is absent.
/// Grounded on `TaxonomyTree.maintain`.
pub fn maintain_taxonomy_tree(
    store: Arc<dyn Store + Send + Sync>,
    paths: &TaxonomyDumpPaths,
    stop_flag: Arc<AtomicBool>,
    config: TaxonomyMaintenanceConfig,
) -> Result<Arc<TaxonomyMaintenanceStatistics>> {
    let statistics = Arc::new(TaxonomyMaintenanceStatistics::new());

    if paths.nodes.exists() && paths.names.exists() {
        build_taxonomies(&store, paths, &statistics, Arc::clone(&stop_flag), config)?;
    } else {
        info!("no nodes.dmp/names.dmp found, skipping taxonomy tree build");
    }

    if !stop_flag.load(Ordering::Relaxed) && paths.merged.exists() {
        merge_taxonomies(&store, paths, &statistics, Arc::clone(&stop_flag), config)?;
    }

    if !stop_flag.load(Ordering::Relaxed) && paths.deleted.exists() {
        delete_taxonomies(&store, paths, &statistics, Arc::clone(&stop_flag), config)?;
    }

    Ok(statistics)
}

fn wait_for_capacity(pool: &ThreadPool, max_queued: usize) {
    while pool.queued_count() > max_queued {
        thread::sleep(Duration::from_millis(50));
    }
}

fn jittered_delay() -> Duration {
    Duration::from_secs(rand::thread_rng().gen_range(2..=5))
}

fn build_taxonomies(
    store: &Arc<dyn Store + Send + Sync>,
    paths: &TaxonomyDumpPaths,
    statistics: &Arc<TaxonomyMaintenanceStatistics>,
    stop_flag: Arc<AtomicBool>,
    config: TaxonomyMaintenanceConfig,
) -> Result<()> {
    let number_of_threads = config.number_of_threads.max(1);

    info!("building taxonomy tree from {}", paths.nodes.display());
    let mut taxonomies: HashMap<i64, Taxonomy> = HashMap::new();
    let nodes_file = File::open(&paths.nodes)?;
    for (line_number, line) in BufReader::new(nodes_file).lines().enumerate() {
        let line = line?;
        match parse_node_line(&line) {
            Ok((id, parent_id, rank)) => {
                taxonomies.insert(id, Taxonomy::new(id, parent_id, String::new(), rank));
            }
            Err(error) => warn!("nodes.dmp line {}: {error}", line_number + 1),
        }
    }

    info!("reading taxonomy names from {}", paths.names.display());
    let pool = ThreadPool::new(number_of_threads);
    let names_file = File::open(&paths.names)?;
    let mut chunk = Vec::with_capacity(CHUNK_SIZE);
    for (line_number, line) in BufReader::new(names_file).lines().enumerate() {
        if stop_flag.load(Ordering::Relaxed) {
            info!("taxonomy tree build stopping early: termination requested");
            break;
        }
        let line = line?;
        match parse_name_line(&line) {
            Ok((id, name, name_class)) if name_class == "scientific name" => {
                if let Some(mut taxonomy) = taxonomies.remove(&id) {
                    taxonomy.name = name;
                    chunk.push(taxonomy);
                }
            }
            Ok(_) => {}
            Err(error) => warn!("names.dmp line {}: {error}", line_number + 1),
        }
        if chunk.len() == CHUNK_SIZE {
            wait_for_capacity(&pool, 3 * number_of_threads);
            submit_taxonomy_chunk(&pool, store, statistics, std::mem::take(&mut chunk));
        }
    }
    if !chunk.is_empty() {
        submit_taxonomy_chunk(&pool, store, statistics, chunk);
    }
    pool.join();

    if !taxonomies.is_empty() {
        warn!("{} taxonomy node(s) had no scientific name and were skipped", taxonomies.len());
    }

    Ok(())
}

fn submit_taxonomy_chunk(
    pool: &ThreadPool,
    store: &Arc<dyn Store + Send + Sync>,
    statistics: &Arc<TaxonomyMaintenanceStatistics>,
    chunk: Vec<Taxonomy>,
) {
    let store = Arc::clone(store);
    let statistics = Arc::clone(statistics);
    pool.execute(move || {
        let mut attempts = 0;
        loop {
            match store.bulk_insert_taxonomies(&chunk) {
                Ok(inserted) => {
                    statistics.inserted_taxonomies.fetch_add(inserted as u64, Ordering::Relaxed);
                    break;
                }
                Err(error) => {
                    attempts += 1;
                    if attempts < MAX_COMMIT_ATTEMPTS {
                        thread::sleep(jittered_delay());
                    } else {
                        let ids: Vec<String> = chunk.iter().map(|t| t.id.to_string()).collect();
                        warn!("taxonomy chunk [{}] raised error: {error}", ids.join(", "));
                        break;
                    }
                }
            }
        }
    });
}

fn merge_taxonomies(
    store: &Arc<dyn Store + Send + Sync>,
    paths: &TaxonomyDumpPaths,
    statistics: &Arc<TaxonomyMaintenanceStatistics>,
    stop_flag: Arc<AtomicBool>,
    config: TaxonomyMaintenanceConfig,
) -> Result<()> {
    let number_of_threads = config.number_of_threads.max(1);
    info!("processing taxonomy merges from {}", paths.merged.display());

    let pool = ThreadPool::new(number_of_threads);
    let merge_file = File::open(&paths.merged)?;
    let mut chunk = Vec::with_capacity(CHUNK_SIZE);
    for (line_number, line) in BufReader::new(merge_file).lines().enumerate() {
        if stop_flag.load(Ordering::Relaxed) {
            info!("taxonomy merge stopping early: termination requested");
            break;
        }
        let line = line?;
        match parse_merge_line(&line) {
            Ok((source_id, target_id)) => {
                chunk.push(crate::model::TaxonomyMerge::new(source_id, target_id));
            }
            Err(error) => warn!("merged.dmp line {}: {error}", line_number + 1),
        }
        if chunk.len() == CHUNK_SIZE {
            wait_for_capacity(&pool, 3 * number_of_threads);
            submit_merge_chunk(&pool, store, statistics, std::mem::take(&mut chunk));
        }
    }
    if !chunk.is_empty() {
        submit_merge_chunk(&pool, store, statistics, chunk);
    }
    pool.join();

    Ok(())
}

fn submit_merge_chunk(
    pool: &ThreadPool,
    store: &Arc<dyn Store + Send + Sync>,
    statistics: &Arc<TaxonomyMaintenanceStatistics>,
    chunk: Vec<crate::model::TaxonomyMerge>,
) {
    let store = Arc::clone(store);
    let statistics = Arc::clone(statistics);
    pool.execute(move || {
        let mut attempts = 0;
        loop {
            match store.bulk_insert_taxonomy_merges(&chunk) {
                Ok(inserted) => {
                    statistics.inserted_merges.fetch_add(inserted as u64, Ordering::Relaxed);
                    break;
                }
                Err(error) => {
                    attempts += 1;
                    if attempts < MAX_COMMIT_ATTEMPTS {
                        thread::sleep(jittered_delay());
                    } else {
                        let pairs: Vec<String> = chunk.iter().map(|m| format!("({},{})", m.source_id, m.target_id)).collect();
                        warn!("taxonomy merge [{}] raised error: {error}", pairs.join(", "));
                        break;
                    }
                }
            }
        }
    });
}

fn delete_taxonomies(
    store: &Arc<dyn Store + Send + Sync>,
    paths: &TaxonomyDumpPaths,
    statistics: &Arc<TaxonomyMaintenanceStatistics>,
    stop_flag: Arc<AtomicBool>,
    config: TaxonomyMaintenanceConfig,
) -> Result<()> {
    let number_of_threads = config.number_of_threads.max(1);
    info!("processing taxonomy deletions from {}", paths.deleted.display());

    let pool = ThreadPool::new(number_of_threads);
    let delete_file = File::open(&paths.deleted)?;
    for (line_number, line) in BufReader::new(delete_file).lines().enumerate() {
        if stop_flag.load(Ordering::Relaxed) {
            info!("taxonomy deletion stopping early: termination requested");
            break;
        }
        let line = line?;
        let taxonomy_id = match parse_delete_line(&line) {
            Ok(id) => id,
            Err(error) => {
                warn!("delnodes.dmp line {}: {error}", line_number + 1);
                continue;
            }
        };
        wait_for_capacity(&pool, 3 * number_of_threads);
        let store = Arc::clone(store);
        let statistics = Arc::clone(statistics);
        pool.execute(move || {
            let mut attempts = 0;
            loop {
                match store.delete_taxonomy(taxonomy_id) {
                    Ok(()) => {
                        statistics.deleted_taxonomies.fetch_add(1, Ordering::Relaxed);
                        break;
                    }
                    Err(error) => {
                        attempts += 1;
                        if attempts < MAX_COMMIT_ATTEMPTS {
                            thread::sleep(jittered_delay());
                        } else {
                            warn!("taxonomy deletion {taxonomy_id} raised error: {error}");
                            break;
                        }
                    }
                }
            }
        });
    }
    pool.join();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tempfile::tempdir;

    #[test]
    fn builds_merges_and_deletes_a_small_tree() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("nodes.dmp"),
            "1\t|\t1\t|\tno rank\t|\n9606\t|\t1\t|\tspecies\t|\n9605\t|\t1\t|\tgenus\t|\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("names.dmp"),
            "1\t|\troot\t|\t\t|\tscientific name\t|\n9606\t|\tHomo sapiens\t|\t\t|\tscientific name\t|\n9605\t|\tHomo\t|\t\t|\tscientific name\t|\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("merged.dmp"), "12\t|\t9606\t|\n").unwrap();
        std::fs::write(dir.path().join("delnodes.dmp"), "9605\t|\n").unwrap();

        let store: Arc<dyn Store + Send + Sync> = Arc::new(MemoryStore::new());
        let paths = TaxonomyDumpPaths::from_dir(dir.path());
        let stop_flag = Arc::new(AtomicBool::new(false));
        let statistics = maintain_taxonomy_tree(
            Arc::clone(&store),
            &paths,
            stop_flag,
            TaxonomyMaintenanceConfig { number_of_threads: 2 },
        )
        .unwrap();

        let (inserted_taxonomies, inserted_merges, deleted) = statistics.snapshot();
        assert_eq!(inserted_taxonomies, 3);
        assert_eq!(inserted_merges, 1);
        assert_eq!(deleted, 1);
    }
}
