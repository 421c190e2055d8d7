use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use clap::Args;
use fallible_iterator::FallibleIterator;
use log::{info, warn};
use postgres::NoTls;
use r2d2::Pool;
use r2d2_postgres::PostgresConnectionManager;

use crate::config::Config;
use crate::digestion::{run_digestion, DigestionConfig};
use crate::enzyme::Enzyme;
use crate::error::{Error, Result};
use crate::metadata_collector::{run_metadata_collection, MetadataCollectionConfig};
use crate::model::maintenance_information::{
    DatabaseStatus, DatabaseStatusInfo, PartitionBoundaries, DATABASE_STATUS_KEY, PARTITION_BOUNDARIES_KEY,
};
use crate::model::Protein;
use crate::protein_reader::ProteinReader;
use crate::store::{PostgresStore, Store};
use crate::supervision::install_termination_flag;

#[derive(Debug, Args)]
pub struct DatabaseArgs {
    /// Directory of UniProt text files (`*.txt`/`*.dat`) to ingest.
    #[arg(long)]
    protein_data_dir: PathBuf,

    #[arg(long)]
    database_url: String,

    #[arg(long)]
    thread_count: Option<usize>,

    #[arg(long, default_value = "trypsin")]
    enzyme_name: String,

    #[arg(long, default_value_t = 2)]
    max_missed_cleavages: usize,

    #[arg(long, default_value_t = 6)]
    min_len: usize,

    #[arg(long, default_value_t = 50)]
    max_len: usize,

    #[arg(long, default_value_t = 30)]
    statistics_write_period: u64,

    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// Skip the peptide metadata collection pass after digestion.
    #[arg(long)]
    skip_metadata: bool,
}

pub fn run(args: DatabaseArgs) -> Result<()> {
    let config = Config {
        database_url: args.database_url.clone(),
        work_dir: args.work_dir.clone(),
        thread_count: Config::thread_count_or_all_cores(args.thread_count),
        enzyme_name: args.enzyme_name.clone(),
        max_missed_cleavages: args.max_missed_cleavages,
        min_len: args.min_len,
        max_len: args.max_len,
        statistics_write_period_secs: args.statistics_write_period,
    };

    let manager = PostgresConnectionManager::new(
        config.database_url.parse().map_err(|e| Error::Config(format!("invalid database url: {e}")))?,
        NoTls,
    );
    let pool = Pool::new(manager).map_err(|e| Error::Config(format!("could not build connection pool: {e}")))?;
    let store: Arc<dyn Store + Send + Sync> = Arc::new(PostgresStore::new(pool));

    let enzyme = Arc::new(build_enzyme(&config)?);
    let boundaries = Arc::new(load_or_init_partition_boundaries(store.as_ref())?);

    let termination_flag = install_termination_flag().map_err(Error::Io)?;

    enter_maintenance_mode(store.as_ref())?;

    info!("enqueuing proteins from {}", args.protein_data_dir.display());
    let proteins = read_all_proteins(&args.protein_data_dir)?;

    let mut pending = proteins;
    let mut current_threads = config.thread_count;
    let mut iteration = 0usize;
    let mut total_created = 0u64;
    let mut total_inserted = 0u64;

    loop {
        let pass_size = pending.len();
        let (statistics, unprocessible) = run_digestion(
            Arc::clone(&store),
            pending,
            Arc::clone(&enzyme),
            Arc::clone(&boundaries),
            Arc::clone(&termination_flag),
            DigestionConfig {
                number_of_threads: current_threads,
                retry_policy: Default::default(),
            },
        );
        let (created, failed, inserted) = statistics.snapshot();
        total_created += created;
        total_inserted += inserted;
        info!("digestion pass {iteration} finished: {created} proteins created, {inserted} peptides inserted, {failed} unprocessible");

        if unprocessible.is_empty() {
            break;
        }

        let log_path = config.work_dir.join(format!("unprocessible_proteins_{iteration}.txt"));
        let contents: String = unprocessible.iter().map(|p| format!("{}\n", p.to_fasta_entry())).collect();
        std::fs::write(&log_path, contents)?;

        let made_no_progress = unprocessible.len() >= pass_size;
        if termination_flag.load(Ordering::Relaxed) || made_no_progress {
            warn!(
                "{} protein(s) remain unprocessible after {} pass(es), see {}",
                unprocessible.len(),
                iteration + 1,
                log_path.display()
            );
            break;
        }

        current_threads = (current_threads / 3).max(1);
        iteration += 1;
        info!("retrying {} unprocessible protein(s) with {current_threads} thread(s)", unprocessible.len());
        pending = unprocessible;
    }
    info!("digestion finished: {total_created} proteins created, {total_inserted} peptides inserted");

    if !args.skip_metadata {
        let metadata_statistics = run_metadata_collection(
            Arc::clone(&store),
            Arc::clone(&termination_flag),
            MetadataCollectionConfig {
                number_of_threads: config.thread_count,
            },
        );
        info!("metadata collection finished: {} peptides updated", metadata_statistics.snapshot());
    }

    leave_maintenance_mode(store.as_ref())?;

    Ok(())
}

/// Loads the partition plan written by a previous run, or falls back to a
/// single all-encompassing partition and persists it so later runs (and
/// `precursor-range`) see the same boundaries.
fn load_or_init_partition_boundaries(store: &dyn Store) -> Result<PartitionBoundaries> {
    match store.load_maintenance_information(PARTITION_BOUNDARIES_KEY)? {
        Some(info) => Ok(PartitionBoundaries::from_maintenance_information(&info)
            .map_err(|e| Error::Config(format!("malformed partition_boundaries row: {e}")))?),
        None => {
            let boundaries = PartitionBoundaries::default();
            store.save_maintenance_information(&boundaries.to_maintenance_information())?;
            Ok(boundaries)
        }
    }
}

fn load_database_status(store: &dyn Store) -> Result<DatabaseStatusInfo> {
    match store.load_maintenance_information(DATABASE_STATUS_KEY)? {
        Some(info) => Ok(DatabaseStatusInfo::from_maintenance_information(&info)
            .map_err(|e| Error::Config(format!("malformed database_status row: {e}")))?),
        None => Ok(DatabaseStatusInfo::default()),
    }
}

fn enter_maintenance_mode(store: &dyn Store) -> Result<()> {
    let mut status = load_database_status(store)?;
    status.maintenance_mode = true;
    status.status = DatabaseStatus::Maintenance;
    store.save_maintenance_information(&status.to_maintenance_information())?;
    Ok(())
}

fn leave_maintenance_mode(store: &dyn Store) -> Result<()> {
    let mut status = load_database_status(store)?;
    status.maintenance_mode = false;
    status.status = DatabaseStatus::Ready;
    status.last_update = Some(chrono::Utc::now().timestamp());
    store.save_maintenance_information(&status.to_maintenance_information())?;
    Ok(())
}

fn build_enzyme(config: &Config) -> Result<Enzyme> {
    let enzyme = match config.enzyme_name.to_lowercase().as_str() {
        "unspecific" => Enzyme::unspecific(config.min_len, config.max_len)?,
        _ => Enzyme::trypsin(config.max_missed_cleavages, config.min_len, config.max_len)?,
    };
    Ok(enzyme)
}

fn read_all_proteins(dir: &PathBuf) -> Result<Vec<Protein>> {
    let mut proteins = Vec::new();
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| matches!(path.extension().and_then(|e| e.to_str()), Some("txt") | Some("dat")))
        .collect();
    paths.sort();
    for path in paths {
        let file = File::open(&path)?;
        let mut reader = ProteinReader::new(BufReader::new(file));
        while let Some(protein) = reader.next()? {
            proteins.push(protein);
        }
    }
    Ok(proteins)
}
