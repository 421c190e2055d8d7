mod error;
mod memory;
mod postgres_store;
mod where_condition;

pub use error::{RetryDecision, RetryPolicy, StoreError, StoreErrorKind};
pub use memory::MemoryStore;
pub use postgres_store::PostgresStore;
pub use where_condition::{QueryValue, WhereCondition};

use crate::chemistry::IntegerMass;
use crate::model::maintenance_information::MaintenanceInformation;
use crate::model::{Peptide, PeptideMetadata, Protein, ProteinPeptideAssociation, Taxonomy, TaxonomyMerge};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    MassAscending,
    MassDescending,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectOptions {
    pub order: Option<SortOrder>,
    pub stream: bool,
    pub include_metadata: bool,
}

/// A peptide row paired with its metadata, when [`SelectOptions::include_metadata`]
/// was requested.
#[derive(Debug, Clone)]
pub struct PeptideRow {
    pub peptide: Peptide,
    pub metadata: Option<PeptideMetadata>,
}

/// Every mutation one `digestion::worker::process_protein` call produces,
/// bundled so [`Store::apply_protein_changes`] can commit them as a single
/// transaction.
#[derive(Debug, Clone)]
pub struct ProteinChangeSet {
    pub protein: Protein,
    pub is_new: bool,
    pub new_peptides: Vec<Peptide>,
    pub new_associations: Vec<ProteinPeptideAssociation>,
    pub removed_association_sequences: Vec<String>,
    pub stale_peptide_keys: Vec<(i32, IntegerMass, String)>,
}

/// The storage contract. Transactions are per-protein: a single digestion
/// pass over one protein commits its row, its new peptide rows, its new
/// association rows, and any staleness flags atomically, or rolls back
/// completely.
pub trait Store {
    /// Proteins whose primary accession is any of `accessions` (primary or
    /// secondary), ordered as stored.
    fn find_proteins_by_accessions(&self, accessions: &[String]) -> Result<Vec<Protein>, StoreError>;

    fn insert_protein(&self, protein: &Protein) -> Result<(), StoreError>;

    fn update_protein(&self, protein: &Protein) -> Result<(), StoreError>;

    /// Deletes a protein and its associations; peptides themselves are
    /// never deleted by this call.
    fn delete_protein(&self, accession: &str) -> Result<(), StoreError>;

    /// Inserts peptides not already present at `(partition, mass, sequence)`.
    /// Returns the number of rows actually inserted.
    fn bulk_insert_peptides(&self, peptides: &[Peptide]) -> Result<usize, StoreError>;

    fn bulk_insert_associations(&self, associations: &[ProteinPeptideAssociation]) -> Result<usize, StoreError>;

    /// Flips `metadata_up_to_date` to `false` for the given `(partition,
    /// mass, sequence)` keys.
    fn flag_peptides_stale(&self, keys: &[(i32, IntegerMass, String)]) -> Result<usize, StoreError>;

    fn upsert_peptide_metadata(
        &self,
        partition: i32,
        mass: IntegerMass,
        sequence: &str,
        metadata: &PeptideMetadata,
    ) -> Result<(), StoreError>;

    fn mark_metadata_fresh(&self, partition: i32, mass: IntegerMass, sequence: &str) -> Result<(), StoreError>;

    /// Streams every peptide currently flagged `metadata_up_to_date = false`
    /// in batches of `batch_size`.
    fn select_stale_peptide_batch(&self, batch_size: usize, after: Option<(i32, IntegerMass, String)>) -> Result<Vec<Peptide>, StoreError>;

    /// Proteins associated with a given peptide, via the association table.
    fn proteins_containing_peptide(&self, partition: i32, mass: IntegerMass, sequence: &str) -> Result<Vec<Protein>, StoreError>;

    /// Peptides currently referenced by a protein's associations, together
    /// with their `is_metadata_up_to_date` flag.
    fn peptides_for_protein(&self, accession: &str) -> Result<Vec<Peptide>, StoreError>;

    /// Of `keys`, the subset already present in the catalog, as full
    /// `Peptide` rows.
    fn find_existing_peptides(&self, keys: &[(i32, IntegerMass, String)]) -> Result<Vec<Peptide>, StoreError>;

    /// Removes the association between `protein_accession` and every
    /// sequence in `sequences`, without touching the peptide rows.
    fn remove_associations(&self, protein_accession: &str, sequences: &[String]) -> Result<usize, StoreError>;

    /// Selects peptides matching `where_condition`. When `options.stream` is
    /// set, implementations are expected to use a server-side cursor rather
    /// than materialising the full result set; the in-memory store has no
    /// such distinction to make.
    fn select_peptides(&self, where_condition: &WhereCondition, options: SelectOptions) -> Result<Vec<PeptideRow>, StoreError>;

    /// Commits every mutation of a single protein's digestion pass (its own
    /// row, its new peptides, its new and removed associations, and any
    /// staleness flags) as one transaction. Returns the number of peptide
    /// rows actually inserted.
    fn apply_protein_changes(&self, changes: &ProteinChangeSet) -> Result<usize, StoreError>;

    /// Writes a peptide's metadata and clears its staleness flag as a single
    /// transaction, so a crash between the two never leaves metadata written
    /// but the peptide still flagged stale.
    fn apply_peptide_metadata_update(
        &self,
        partition: i32,
        mass: IntegerMass,
        sequence: &str,
        metadata: &PeptideMetadata,
    ) -> Result<(), StoreError>;

    /// Loads a `maintenance_information` row by key (`database_status`,
    /// `digestion_parameters`, `partition_boundaries`), if present.
    fn load_maintenance_information(&self, key: &str) -> Result<Option<MaintenanceInformation>, StoreError>;

    /// Upserts a `maintenance_information` row.
    fn save_maintenance_information(&self, info: &MaintenanceInformation) -> Result<(), StoreError>;

    /// Bulk-inserts taxonomy nodes, overwriting any existing row with the
    /// same id (re-running a taxonomy ingest is idempotent).
    fn bulk_insert_taxonomies(&self, taxonomies: &[Taxonomy]) -> Result<usize, StoreError>;

    /// Bulk-inserts taxonomy merge records (`old id -> new id`).
    fn bulk_insert_taxonomy_merges(&self, merges: &[TaxonomyMerge]) -> Result<usize, StoreError>;

    /// Deletes a taxonomy node and any merge record referencing it, as one
    /// transaction.
    fn delete_taxonomy(&self, id: i64) -> Result<(), StoreError>;
}
