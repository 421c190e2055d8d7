mod database;
mod precursor_range;
mod serve;
mod statistics;
mod taxonomy;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "macpepdb", version, about = "Partitioned tryptic peptide catalog")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest a directory of UniProt text files and keep the catalog's
    /// peptide metadata up to date.
    Database(database::DatabaseArgs),
    /// Compile a mass-tolerant, optionally modified precursor search into
    /// its SQL predicate and print it, without running it.
    PrecursorRange(precursor_range::PrecursorRangeArgs),
    /// Print the latest rows written by a run's statistics CSV.
    Statistics(statistics::StatisticsArgs),
    /// Ingest an NCBI `taxdump` directory into the `taxonomies` and
    /// `taxonomy_merges` tables.
    Taxonomy(taxonomy::TaxonomyArgs),
    /// Stub for a future HTTP front-end; currently only validates its args.
    Serve(serve::ServeArgs),
}

pub fn run(cli: Cli) -> crate::error::Result<()> {
    match cli.command {
        Command::Database(args) => database::run(args),
        Command::PrecursorRange(args) => precursor_range::run(args),
        Command::Statistics(args) => statistics::run(args),
        Command::Taxonomy(args) => taxonomy::run(args),
        Command::Serve(args) => serve::run(args),
    }
}
