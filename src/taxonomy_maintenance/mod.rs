mod statistics;
mod worker;

pub use statistics::TaxonomyMaintenanceStatistics;
pub use worker::{maintain_taxonomy_tree, TaxonomyDumpPaths, TaxonomyMaintenanceConfig};
