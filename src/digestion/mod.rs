mod statistics;
mod supervisor;
mod worker;

pub use statistics::DigestionStatistics;
pub use supervisor::{run_digestion, DigestionConfig};
pub use worker::{process_protein, DigestionOutcome};
