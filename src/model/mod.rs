pub mod association;
pub mod maintenance_information;
pub mod peptide;
pub mod peptide_metadata;
pub mod protein;
pub mod taxonomy;

pub use association::ProteinPeptideAssociation;
pub use peptide::{Peptide, ResidueCounts};
pub use peptide_metadata::{ContainingProteinFacts, PeptideMetadata};
pub use protein::Protein;
pub use taxonomy::{Taxonomy, TaxonomyMerge, TaxonomyRank};
