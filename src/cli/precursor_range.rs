use std::path::PathBuf;

use clap::Args;

use crate::chemistry::IntegerMass;
use crate::combination::enumerate_combinations;
use crate::error::Result;
use crate::modification::{Modification, ModificationCollection};
use crate::predicate::compile_predicate;

#[derive(Debug, Args)]
pub struct PrecursorRangeArgs {
    /// Neutral mass in Dalton.
    #[arg(long, short = 'p')]
    precursor: f64,

    #[arg(long, short = 'l', default_value_t = 5)]
    lower_tolerance_ppm: i64,

    #[arg(long, short = 'u', default_value_t = 5)]
    upper_tolerance_ppm: i64,

    /// CSV file of post-translational modifications to consider.
    #[arg(long, short = 'm')]
    modifications: Option<PathBuf>,

    #[arg(long, short = 'v', default_value_t = 3)]
    variable_modification_maximum: i64,
}

pub fn run(args: PrecursorRangeArgs) -> Result<()> {
    let precursor = IntegerMass::from_dalton(args.precursor);
    let modifications = match &args.modifications {
        Some(path) => ModificationCollection::new(Modification::read_from_csv(path)?)?,
        None => ModificationCollection::new(Vec::new())?,
    };
    let combinations = enumerate_combinations(
        &modifications,
        precursor,
        args.lower_tolerance_ppm,
        args.upper_tolerance_ppm,
        args.variable_modification_maximum,
    );
    let compiled = compile_predicate(&combinations, None)?;
    println!("{}", compiled.sql);
    println!("{} bound value(s)", compiled.values.len());
    for value in &compiled.values {
        println!("  {value:?}");
    }
    Ok(())
}
