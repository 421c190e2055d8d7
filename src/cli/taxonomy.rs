use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use postgres::NoTls;
use r2d2::Pool;
use r2d2_postgres::PostgresConnectionManager;

use crate::error::{Error, Result};
use crate::store::{PostgresStore, Store};
use crate::supervision::install_termination_flag;
use crate::taxonomy_maintenance::{maintain_taxonomy_tree, TaxonomyDumpPaths, TaxonomyMaintenanceConfig};

#[derive(Debug, Args)]
pub struct TaxonomyArgs {
    /// Directory containing the extracted NCBI `taxdump` files
    /// (`nodes.dmp`, `names.dmp`, `merged.dmp`, `delnodes.dmp`). A run
    /// proceeds with whichever of these files are actually present.
    #[arg(long)]
    dump_dir: PathBuf,

    #[arg(long)]
    database_url: String,

    #[arg(long)]
    thread_count: Option<usize>,
}

pub fn run(args: TaxonomyArgs) -> Result<()> {
    let manager = PostgresConnectionManager::new(
        args.database_url.parse().map_err(|e| Error::Config(format!("invalid database url: {e}")))?,
        NoTls,
    );
    let pool = Pool::new(manager).map_err(|e| Error::Config(format!("could not build connection pool: {e}")))?;
    let store: Arc<dyn Store + Send + Sync> = Arc::new(PostgresStore::new(pool));

    let termination_flag = install_termination_flag().map_err(Error::Io)?;
    let paths = TaxonomyDumpPaths::from_dir(&args.dump_dir);
    let config = TaxonomyMaintenanceConfig {
        number_of_threads: crate::config::Config::thread_count_or_all_cores(args.thread_count),
    };

    let statistics = maintain_taxonomy_tree(store, &paths, termination_flag, config)?;
    let (inserted_taxonomies, inserted_merges, deleted) = statistics.snapshot();
    log::info!(
        "taxonomy maintenance finished: {inserted_taxonomies} taxonomies inserted, {inserted_merges} merges applied, {deleted} taxonomies deleted"
    );
    Ok(())
}
