use std::path::PathBuf;

use clap::Args;

use crate::error::Result;

#[derive(Debug, Args)]
pub struct StatisticsArgs {
    /// Path to a statistics CSV written by a previous digestion or metadata run.
    csv_path: PathBuf,

    /// Number of trailing rows to print.
    #[arg(long, default_value_t = 10)]
    tail: usize,
}

pub fn run(args: StatisticsArgs) -> Result<()> {
    let mut reader = csv::Reader::from_path(&args.csv_path)?;
    let header = reader.headers()?.clone();
    let rows: Vec<csv::StringRecord> = reader.records().collect::<std::result::Result<_, _>>()?;
    println!("{}", header.iter().collect::<Vec<_>>().join("\t"));
    for row in rows.iter().rev().take(args.tail).rev() {
        println!("{}", row.iter().collect::<Vec<_>>().join("\t"));
    }
    Ok(())
}
