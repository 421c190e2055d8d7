/// Derived, eventually-consistent summary of the proteins containing a
/// peptide. Keyed by the same `(partition, mass, sequence)` triple as its
/// peptide.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeptideMetadata {
    pub is_swiss_prot: bool,
    pub is_trembl: bool,
    pub taxonomy_ids: Vec<i64>,
    pub unique_taxonomy_ids: Vec<i64>,
    pub proteome_ids: Vec<String>,
}

/// A fact about one protein containing a peptide, as needed to fold into
/// [`PeptideMetadata`]. Deliberately narrower than [`crate::model::Protein`];
/// the metadata collector never needs the sequence or accession.
#[derive(Debug, Clone)]
pub struct ContainingProteinFacts {
    pub is_reviewed: bool,
    pub taxonomy_id: Option<i64>,
    pub proteome_id: Option<String>,
}

impl PeptideMetadata {
    /// Computes metadata for a peptide from the facts of every protein
    /// currently associated with it.
    pub fn compute(proteins: &[ContainingProteinFacts]) -> Self {
        let is_swiss_prot = proteins.iter().any(|p| p.is_reviewed);
        let is_trembl = proteins.iter().any(|p| !p.is_reviewed);

        let mut taxonomy_counts: std::collections::BTreeMap<i64, usize> = Default::default();
        for protein in proteins {
            if let Some(taxonomy_id) = protein.taxonomy_id {
                *taxonomy_counts.entry(taxonomy_id).or_insert(0) += 1;
            }
        }
        let taxonomy_ids: Vec<i64> = taxonomy_counts.keys().copied().collect();
        let unique_taxonomy_ids: Vec<i64> = taxonomy_counts
            .iter()
            .filter(|&(_, &count)| count == 1)
            .map(|(&id, _)| id)
            .collect();

        let mut proteome_ids: std::collections::BTreeSet<String> = Default::default();
        for protein in proteins {
            if let Some(proteome_id) = &protein.proteome_id {
                proteome_ids.insert(proteome_id.clone());
            }
        }

        Self {
            is_swiss_prot,
            is_trembl,
            taxonomy_ids,
            unique_taxonomy_ids,
            proteome_ids: proteome_ids.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_review_status_sets_both_flags() {
        let facts = vec![
            ContainingProteinFacts {
                is_reviewed: true,
                taxonomy_id: Some(9606),
                proteome_id: Some("UP1".into()),
            },
            ContainingProteinFacts {
                is_reviewed: false,
                taxonomy_id: Some(10090),
                proteome_id: Some("UP2".into()),
            },
        ];
        let metadata = PeptideMetadata::compute(&facts);
        assert!(metadata.is_swiss_prot);
        assert!(metadata.is_trembl);
        assert_eq!(metadata.taxonomy_ids, vec![9606, 10090]);
        assert_eq!(metadata.unique_taxonomy_ids, vec![9606, 10090]);
    }

    #[test]
    fn shared_taxonomy_is_not_unique() {
        let facts = vec![
            ContainingProteinFacts {
                is_reviewed: true,
                taxonomy_id: Some(9606),
                proteome_id: None,
            },
            ContainingProteinFacts {
                is_reviewed: true,
                taxonomy_id: Some(9606),
                proteome_id: None,
            },
        ];
        let metadata = PeptideMetadata::compute(&facts);
        assert_eq!(metadata.taxonomy_ids, vec![9606]);
        assert!(metadata.unique_taxonomy_ids.is_empty());
    }
}
