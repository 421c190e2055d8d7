use crate::chemistry::IntegerMass;
use crate::enzyme::Enzyme;
use crate::model::maintenance_information::PartitionBoundaries;
use crate::model::{Peptide, Protein, ProteinPeptideAssociation};
use crate::store::{ProteinChangeSet, Store, StoreError};

/// Result of digesting a single incoming protein record against the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestionOutcome {
    pub created_protein: bool,
    pub inserted_peptides: usize,
}

fn partition_for(boundaries: &PartitionBoundaries, mass: IntegerMass) -> i32 {
    boundaries.partition_for(mass.raw()).unwrap_or(0)
}

/// Looks up `protein` by its primary and secondary accessions and either
/// creates it or folds the update into the existing stored row.
pub fn process_protein(
    store: &dyn Store,
    protein: &Protein,
    enzyme: &Enzyme,
    boundaries: &PartitionBoundaries,
) -> Result<DigestionOutcome, StoreError> {
    let mut accessions = vec![protein.accession.clone()];
    accessions.extend(protein.secondary_accessions.iter().cloned());
    let mut stored = store.find_proteins_by_accessions(&accessions)?;

    match stored.pop() {
        Some(existing) => {
            let inserted = update_protein(store, &existing, protein, enzyme, boundaries)?;
            Ok(DigestionOutcome {
                created_protein: false,
                inserted_peptides: inserted,
            })
        }
        None => {
            let inserted = create_protein(store, protein, enzyme, boundaries)?;
            Ok(DigestionOutcome {
                created_protein: true,
                inserted_peptides: inserted,
            })
        }
    }
}

/// Creates a new protein, digesting and associating its peptides. Grounded
/// on `Protein.create`. The protein row, its peptide inserts, its
/// associations and any staleness flags commit as one transaction via
/// `Store::apply_protein_changes`.
fn create_protein(
    store: &dyn Store,
    protein: &Protein,
    enzyme: &Enzyme,
    boundaries: &PartitionBoundaries,
) -> Result<usize, StoreError> {
    let digested = enzyme.digest(&protein.sequence).unwrap_or_default();
    if digested.is_empty() {
        store.apply_protein_changes(&ProteinChangeSet {
            protein: protein.clone(),
            is_new: true,
            new_peptides: Vec::new(),
            new_associations: Vec::new(),
            removed_association_sequences: Vec::new(),
            stale_peptide_keys: Vec::new(),
        })?;
        return Ok(0);
    }

    let mut candidates: Vec<Peptide> = digested
        .into_iter()
        .map(|d| {
            let mut peptide = Peptide::new(d.sequence, d.number_of_missed_cleavages, 0);
            peptide.partition = partition_for(boundaries, peptide.mass);
            peptide
        })
        .collect();

    let keys: Vec<(i32, IntegerMass, String)> = candidates
        .iter()
        .map(|p| (p.partition, p.mass, p.sequence.clone()))
        .collect();
    let existing = store.find_existing_peptides(&keys)?;

    let mut associations = Vec::with_capacity(candidates.len());
    let mut peptides_for_metadata_update = Vec::new();
    for existing_peptide in &existing {
        candidates.retain(|c| c.sequence != existing_peptide.sequence);
        associations.push(ProteinPeptideAssociation::new(
            protein.accession.clone(),
            existing_peptide.partition,
            existing_peptide.mass,
            existing_peptide.sequence.clone(),
        ));
        if existing_peptide.is_metadata_up_to_date {
            peptides_for_metadata_update.push(existing_peptide.clone());
        }
    }
    for peptide in &candidates {
        associations.push(ProteinPeptideAssociation::new(
            protein.accession.clone(),
            peptide.partition,
            peptide.mass,
            peptide.sequence.clone(),
        ));
    }

    let stale_peptide_keys: Vec<(i32, IntegerMass, String)> = peptides_for_metadata_update
        .iter()
        .map(|p| (p.partition, p.mass, p.sequence.clone()))
        .collect();

    store.apply_protein_changes(&ProteinChangeSet {
        protein: protein.clone(),
        is_new: true,
        new_peptides: candidates,
        new_associations: associations,
        removed_association_sequences: Vec::new(),
        stale_peptide_keys,
    })
}

/// Folds `updated` into `stored` if `updated` carries a newer `updated_at`
/// timestamp, re-digesting only when the sequence actually changed. The
/// updated row, its peptide changes, its association changes and any
/// staleness flags commit as one transaction via `Store::apply_protein_changes`.
fn update_protein(
    store: &dyn Store,
    stored: &Protein,
    updated: &Protein,
    enzyme: &Enzyme,
    boundaries: &PartitionBoundaries,
) -> Result<usize, StoreError> {
    if stored.updated_at >= updated.updated_at {
        return Ok(0);
    }

    let sequence_changed = updated.sequence != stored.sequence;
    let mut new_peptides = Vec::new();
    let mut associations = Vec::new();
    let mut sequences_to_unreference = Vec::new();
    let mut stale_peptide_keys = Vec::new();

    if sequence_changed {
        let digested = enzyme.digest(&updated.sequence).unwrap_or_default();
        let mut candidates: Vec<Peptide> = digested
            .into_iter()
            .map(|d| {
                let mut peptide = Peptide::new(d.sequence, d.number_of_missed_cleavages, 0);
                peptide.partition = partition_for(boundaries, peptide.mass);
                peptide
            })
            .collect();

        let currently_referenced = store.peptides_for_protein(&stored.accession)?;
        let mut peptides_for_metadata_update = Vec::new();
        for referenced in &currently_referenced {
            if !candidates.iter().any(|p| p.sequence == referenced.sequence) {
                sequences_to_unreference.push(referenced.sequence.clone());
                if referenced.is_metadata_up_to_date {
                    peptides_for_metadata_update.push(referenced.clone());
                }
            } else {
                candidates.retain(|p| p.sequence != referenced.sequence);
            }
        }

        if !candidates.is_empty() {
            let keys: Vec<(i32, IntegerMass, String)> = candidates
                .iter()
                .map(|p| (p.partition, p.mass, p.sequence.clone()))
                .collect();
            let existing = store.find_existing_peptides(&keys)?;

            for existing_peptide in &existing {
                candidates.retain(|c| c.sequence != existing_peptide.sequence);
                associations.push(ProteinPeptideAssociation::new(
                    stored.accession.clone(),
                    existing_peptide.partition,
                    existing_peptide.mass,
                    existing_peptide.sequence.clone(),
                ));
                if existing_peptide.is_metadata_up_to_date {
                    peptides_for_metadata_update.push(existing_peptide.clone());
                }
            }
            for peptide in &candidates {
                associations.push(ProteinPeptideAssociation::new(
                    stored.accession.clone(),
                    peptide.partition,
                    peptide.mass,
                    peptide.sequence.clone(),
                ));
            }
        }

        new_peptides = candidates;
        stale_peptide_keys = peptides_for_metadata_update
            .iter()
            .map(|p| (p.partition, p.mass, p.sequence.clone()))
            .collect();
    }

    store.apply_protein_changes(&ProteinChangeSet {
        protein: updated.clone(),
        is_new: false,
        new_peptides,
        new_associations: associations,
        removed_association_sequences: sequences_to_unreference,
        stale_peptide_keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enzyme::Enzyme;
    use crate::model::maintenance_information::PartitionBoundary;
    use crate::store::MemoryStore;

    fn boundaries() -> PartitionBoundaries {
        PartitionBoundaries {
            boundaries: vec![PartitionBoundary {
                partition: 0,
                lower: 0,
                upper: i64::MAX,
            }],
        }
    }

    fn leptin(accession: &str, updated_at: i64) -> Protein {
        Protein::new(
            accession.to_string(),
            Vec::new(),
            "LEP_HUMAN".to_string(),
            "Leptin".to_string(),
            "MDQTLAIYQQILASLPSR".to_string(),
            Some(9606),
            Some("UP000005640".to_string()),
            true,
            updated_at,
        )
    }

    #[test]
    fn creates_protein_and_its_peptides() {
        let store = MemoryStore::new();
        let enzyme = Enzyme::trypsin(2, 5, 50).unwrap();
        let protein = leptin("P1", 1);
        let outcome = process_protein(&store, &protein, &enzyme, &boundaries()).unwrap();
        assert!(outcome.created_protein);
        assert!(outcome.inserted_peptides > 0);
        assert_eq!(store.find_proteins_by_accessions(&["P1".to_string()]).unwrap().len(), 1);
    }

    #[test]
    fn update_is_skipped_when_not_newer() {
        let store = MemoryStore::new();
        let enzyme = Enzyme::trypsin(2, 5, 50).unwrap();
        let protein = leptin("P1", 5);
        process_protein(&store, &protein, &enzyme, &boundaries()).unwrap();

        let stale_update = leptin("P1", 1);
        let outcome = process_protein(&store, &stale_update, &enzyme, &boundaries()).unwrap();
        assert!(!outcome.created_protein);
        assert_eq!(outcome.inserted_peptides, 0);
    }

    #[test]
    fn second_protein_reuses_shared_peptides() {
        let store = MemoryStore::new();
        let enzyme = Enzyme::trypsin(2, 5, 50).unwrap();
        let protein_a = leptin("P1", 1);
        process_protein(&store, &protein_a, &enzyme, &boundaries()).unwrap();

        let mut protein_b = leptin("P2", 1);
        protein_b.sequence = protein_a.sequence.clone();
        let outcome = process_protein(&store, &protein_b, &enzyme, &boundaries()).unwrap();
        assert!(outcome.created_protein);
        assert_eq!(outcome.inserted_peptides, 0);
    }
}
