mod signals;
mod statistics_logger;

pub use signals::install_termination_flag;
pub use statistics_logger::StatisticsLogger;
