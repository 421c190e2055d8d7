use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Resolved configuration for a digestion/maintenance run, built from CLI
/// flags with `.env`-provided defaults loaded via `dotenv`. Kept as a plain
/// struct rather than threading a dozen loose arguments through every
/// worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub work_dir: PathBuf,
    pub thread_count: usize,
    pub enzyme_name: String,
    pub max_missed_cleavages: usize,
    pub min_len: usize,
    pub max_len: usize,
    pub statistics_write_period_secs: u64,
}

impl Config {
    pub fn thread_count_or_all_cores(requested: Option<usize>) -> usize {
        match requested {
            Some(count) => count.clamp(1, num_cpus::get()),
            None => num_cpus::get(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            work_dir: PathBuf::from("."),
            thread_count: num_cpus::get(),
            enzyme_name: "trypsin".to_string(),
            max_missed_cleavages: 2,
            min_len: 6,
            max_len: 50,
            statistics_write_period_secs: 30,
        }
    }
}
