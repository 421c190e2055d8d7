mod statistics;
mod worker;

pub use statistics::MetadataStatistics;
pub use worker::{run_metadata_collection, MetadataCollectionConfig};
