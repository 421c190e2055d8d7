use std::collections::HashMap;
use std::sync::Mutex;

use crate::chemistry::IntegerMass;
use crate::model::maintenance_information::MaintenanceInformation;
use crate::model::{Peptide, PeptideMetadata, Protein, ProteinPeptideAssociation, Taxonomy, TaxonomyMerge};

use super::{PeptideRow, ProteinChangeSet, SelectOptions, Store, StoreError};

type PeptideKey = (i32, i64, String);

/// A `Mutex`-guarded in-memory [`Store`], used by the test suite in place of
/// a real Postgres instance. It honours the same contract (atomic
/// per-protein upserts, idempotent peptide inserts) without any of the
/// driver-level error classification `PostgresStore` has to do.
#[derive(Default)]
pub struct MemoryStore {
    proteins: Mutex<HashMap<String, Protein>>,
    peptides: Mutex<HashMap<PeptideKey, Peptide>>,
    associations: Mutex<Vec<ProteinPeptideAssociation>>,
    metadata: Mutex<HashMap<PeptideKey, PeptideMetadata>>,
    maintenance_information: Mutex<HashMap<String, MaintenanceInformation>>,
    taxonomies: Mutex<HashMap<i64, Taxonomy>>,
    taxonomy_merges: Mutex<Vec<TaxonomyMerge>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(partition: i32, mass: IntegerMass, sequence: &str) -> PeptideKey {
        (partition, mass.raw(), sequence.to_string())
    }
}

impl Store for MemoryStore {
    fn find_proteins_by_accessions(&self, accessions: &[String]) -> Result<Vec<Protein>, StoreError> {
        let proteins = self.proteins.lock().unwrap();
        Ok(proteins
            .values()
            .filter(|protein| {
                accessions.contains(&protein.accession)
                    || protein.secondary_accessions.iter().any(|a| accessions.contains(a))
            })
            .cloned()
            .collect())
    }

    fn insert_protein(&self, protein: &Protein) -> Result<(), StoreError> {
        self.proteins.lock().unwrap().insert(protein.accession.clone(), protein.clone());
        Ok(())
    }

    fn update_protein(&self, protein: &Protein) -> Result<(), StoreError> {
        self.proteins.lock().unwrap().insert(protein.accession.clone(), protein.clone());
        Ok(())
    }

    fn delete_protein(&self, accession: &str) -> Result<(), StoreError> {
        self.proteins.lock().unwrap().remove(accession);
        self.associations.lock().unwrap().retain(|assoc| assoc.protein_accession != accession);
        Ok(())
    }

    fn bulk_insert_peptides(&self, peptides: &[Peptide]) -> Result<usize, StoreError> {
        let mut store = self.peptides.lock().unwrap();
        let mut inserted = 0;
        for peptide in peptides {
            let key = Self::key(peptide.partition, peptide.mass, &peptide.sequence);
            if store.insert(key, peptide.clone()).is_none() {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn bulk_insert_associations(&self, associations: &[ProteinPeptideAssociation]) -> Result<usize, StoreError> {
        let mut store = self.associations.lock().unwrap();
        let mut inserted = 0;
        for association in associations {
            if !store.contains(association) {
                store.push(association.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn flag_peptides_stale(&self, keys: &[(i32, IntegerMass, String)]) -> Result<usize, StoreError> {
        let mut store = self.peptides.lock().unwrap();
        let mut flagged = 0;
        for (partition, mass, sequence) in keys {
            if let Some(peptide) = store.get_mut(&Self::key(*partition, *mass, sequence)) {
                peptide.is_metadata_up_to_date = false;
                flagged += 1;
            }
        }
        Ok(flagged)
    }

    fn upsert_peptide_metadata(
        &self,
        partition: i32,
        mass: IntegerMass,
        sequence: &str,
        metadata: &PeptideMetadata,
    ) -> Result<(), StoreError> {
        self.metadata
            .lock()
            .unwrap()
            .insert(Self::key(partition, mass, sequence), metadata.clone());
        Ok(())
    }

    fn mark_metadata_fresh(&self, partition: i32, mass: IntegerMass, sequence: &str) -> Result<(), StoreError> {
        if let Some(peptide) = self.peptides.lock().unwrap().get_mut(&Self::key(partition, mass, sequence)) {
            peptide.is_metadata_up_to_date = true;
        }
        Ok(())
    }

    fn select_stale_peptide_batch(
        &self,
        batch_size: usize,
        after: Option<(i32, IntegerMass, String)>,
    ) -> Result<Vec<Peptide>, StoreError> {
        let store = self.peptides.lock().unwrap();
        let mut keys: Vec<&PeptideKey> = store.keys().collect();
        keys.sort();
        let start = match after {
            Some((partition, mass, sequence)) => {
                let after_key = Self::key(partition, mass, sequence);
                keys.iter().position(|k| **k > after_key).unwrap_or(keys.len())
            }
            None => 0,
        };
        Ok(keys[start..]
            .iter()
            .filter_map(|key| store.get(*key))
            .filter(|peptide| !peptide.is_metadata_up_to_date)
            .take(batch_size)
            .cloned()
            .collect())
    }

    fn proteins_containing_peptide(&self, partition: i32, mass: IntegerMass, sequence: &str) -> Result<Vec<Protein>, StoreError> {
        let associations = self.associations.lock().unwrap();
        let proteins = self.proteins.lock().unwrap();
        Ok(associations
            .iter()
            .filter(|assoc| assoc.partition == partition && assoc.peptide_mass == mass && assoc.peptide_sequence == sequence)
            .filter_map(|assoc| proteins.get(&assoc.protein_accession))
            .cloned()
            .collect())
    }

    fn peptides_for_protein(&self, accession: &str) -> Result<Vec<Peptide>, StoreError> {
        let associations = self.associations.lock().unwrap();
        let peptides = self.peptides.lock().unwrap();
        Ok(associations
            .iter()
            .filter(|assoc| assoc.protein_accession == accession)
            .filter_map(|assoc| peptides.get(&Self::key(assoc.partition, assoc.peptide_mass, &assoc.peptide_sequence)))
            .cloned()
            .collect())
    }

    fn find_existing_peptides(&self, keys: &[(i32, IntegerMass, String)]) -> Result<Vec<Peptide>, StoreError> {
        let peptides = self.peptides.lock().unwrap();
        Ok(keys
            .iter()
            .filter_map(|(partition, mass, sequence)| peptides.get(&Self::key(*partition, *mass, sequence)))
            .cloned()
            .collect())
    }

    fn remove_associations(&self, protein_accession: &str, sequences: &[String]) -> Result<usize, StoreError> {
        let mut associations = self.associations.lock().unwrap();
        let before = associations.len();
        associations.retain(|assoc| {
            !(assoc.protein_accession == protein_accession && sequences.contains(&assoc.peptide_sequence))
        });
        Ok(before - associations.len())
    }

    fn select_peptides(&self, where_condition: &super::WhereCondition, options: SelectOptions) -> Result<Vec<PeptideRow>, StoreError> {
        // The in-memory store never parses `where_condition.condition` as
        // SQL; callers driving it (tests, mostly) are expected to pre-filter
        // and pass an always-true condition, or filter the returned rows
        // themselves.
        let _ = where_condition;
        let peptides = self.peptides.lock().unwrap();
        let metadata = self.metadata.lock().unwrap();
        let mut rows: Vec<PeptideRow> = peptides
            .values()
            .map(|peptide| PeptideRow {
                peptide: peptide.clone(),
                metadata: if options.include_metadata {
                    metadata.get(&Self::key(peptide.partition, peptide.mass, &peptide.sequence)).cloned()
                } else {
                    None
                },
            })
            .collect();
        match options.order {
            Some(super::SortOrder::MassAscending) => rows.sort_by_key(|row| row.peptide.mass),
            Some(super::SortOrder::MassDescending) => {
                rows.sort_by_key(|row| std::cmp::Reverse(row.peptide.mass))
            }
            None => {}
        }
        Ok(rows)
    }

    fn apply_protein_changes(&self, changes: &ProteinChangeSet) -> Result<usize, StoreError> {
        if changes.is_new {
            self.insert_protein(&changes.protein)?;
        } else {
            self.update_protein(&changes.protein)?;
        }
        if !changes.removed_association_sequences.is_empty() {
            self.remove_associations(&changes.protein.accession, &changes.removed_association_sequences)?;
        }
        let inserted = if !changes.new_peptides.is_empty() {
            self.bulk_insert_peptides(&changes.new_peptides)?
        } else {
            0
        };
        if !changes.new_associations.is_empty() {
            self.bulk_insert_associations(&changes.new_associations)?;
        }
        if !changes.stale_peptide_keys.is_empty() {
            self.flag_peptides_stale(&changes.stale_peptide_keys)?;
        }
        Ok(inserted)
    }

    fn apply_peptide_metadata_update(
        &self,
        partition: i32,
        mass: IntegerMass,
        sequence: &str,
        metadata: &PeptideMetadata,
    ) -> Result<(), StoreError> {
        self.upsert_peptide_metadata(partition, mass, sequence, metadata)?;
        self.mark_metadata_fresh(partition, mass, sequence)?;
        Ok(())
    }

    fn load_maintenance_information(&self, key: &str) -> Result<Option<MaintenanceInformation>, StoreError> {
        Ok(self.maintenance_information.lock().unwrap().get(key).cloned())
    }

    fn save_maintenance_information(&self, info: &MaintenanceInformation) -> Result<(), StoreError> {
        self.maintenance_information.lock().unwrap().insert(info.key.clone(), info.clone());
        Ok(())
    }

    fn bulk_insert_taxonomies(&self, taxonomies: &[Taxonomy]) -> Result<usize, StoreError> {
        let mut store = self.taxonomies.lock().unwrap();
        for taxonomy in taxonomies {
            store.insert(taxonomy.id, taxonomy.clone());
        }
        Ok(taxonomies.len())
    }

    fn bulk_insert_taxonomy_merges(&self, merges: &[TaxonomyMerge]) -> Result<usize, StoreError> {
        self.taxonomy_merges.lock().unwrap().extend_from_slice(merges);
        Ok(merges.len())
    }

    fn delete_taxonomy(&self, id: i64) -> Result<(), StoreError> {
        self.taxonomies.lock().unwrap().remove(&id);
        self.taxonomy_merges.lock().unwrap().retain(|m| m.source_id != id && m.target_id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WhereCondition;

    #[test]
    fn bulk_insert_peptides_is_idempotent() {
        let store = MemoryStore::new();
        let peptide = Peptide::new("MR".to_string(), 0, 0);
        assert_eq!(store.bulk_insert_peptides(&[peptide.clone()]).unwrap(), 1);
        assert_eq!(store.bulk_insert_peptides(&[peptide]).unwrap(), 0);
    }

    #[test]
    fn flag_and_mark_fresh_round_trip() {
        let store = MemoryStore::new();
        let peptide = Peptide::new("MR".to_string(), 0, 0);
        store.bulk_insert_peptides(&[peptide.clone()]).unwrap();
        store
            .flag_peptides_stale(&[(peptide.partition, peptide.mass, peptide.sequence.clone())])
            .unwrap();
        let stale = store.select_stale_peptide_batch(10, None).unwrap();
        assert_eq!(stale.len(), 1);
        store
            .mark_metadata_fresh(peptide.partition, peptide.mass, &peptide.sequence)
            .unwrap();
        let stale_after = store.select_stale_peptide_batch(10, None).unwrap();
        assert!(stale_after.is_empty());
    }

    #[test]
    fn select_peptides_respects_order() {
        let store = MemoryStore::new();
        store
            .bulk_insert_peptides(&[Peptide::new("MR".to_string(), 0, 0), Peptide::new("MK".to_string(), 0, 0)])
            .unwrap();
        let rows = store
            .select_peptides(
                &WhereCondition::always_true(),
                SelectOptions {
                    order: Some(super::SortOrder::MassAscending),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].peptide.mass <= rows[1].peptide.mass);
    }
}
