use std::hash::{Hash, Hasher};

/// A single UniProt protein record as kept by the catalog.
///
/// Identity is the primary accession; two `Protein`s with the same
/// accession are equal regardless of any other field, matching the
/// store's primary key.
#[derive(Debug, Clone)]
pub struct Protein {
    pub accession: String,
    pub secondary_accessions: Vec<String>,
    pub entry_name: String,
    pub name: String,
    pub sequence: String,
    pub taxonomy_id: Option<i64>,
    pub proteome_id: Option<String>,
    pub is_reviewed: bool,
    pub updated_at: i64,
}

impl Protein {
    pub fn new(
        accession: String,
        secondary_accessions: Vec<String>,
        entry_name: String,
        name: String,
        sequence: String,
        taxonomy_id: Option<i64>,
        proteome_id: Option<String>,
        is_reviewed: bool,
        updated_at: i64,
    ) -> Self {
        Self {
            accession,
            secondary_accessions,
            entry_name,
            name,
            sequence,
            taxonomy_id,
            proteome_id,
            is_reviewed,
            updated_at,
        }
    }

    /// All accessions this protein is reachable by: the primary one first,
    /// then the secondaries.
    pub fn all_accessions(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.accession.as_str())
            .chain(self.secondary_accessions.iter().map(String::as_str))
    }

    pub fn to_fasta_entry(&self) -> String {
        let review_tag = if self.is_reviewed { "sp" } else { "tr" };
        format!(
            ">{}|{}|{} {}\n{}\n",
            review_tag, self.accession, self.entry_name, self.name, self.sequence
        )
    }
}

impl PartialEq for Protein {
    fn eq(&self, other: &Self) -> bool {
        self.accession == other.accession
    }
}

impl Eq for Protein {}

impl Hash for Protein {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.accession.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Protein {
        Protein::new(
            "B".into(),
            vec!["A".into()],
            "LEP_HUMAN".into(),
            "Leptin".into(),
            "MDQTLAIYQQILASLPSR".into(),
            Some(9606),
            Some("UP000005640".into()),
            true,
            1_000_000,
        )
    }

    #[test]
    fn all_accessions_lists_primary_first() {
        let protein = sample();
        let accessions: Vec<&str> = protein.all_accessions().collect();
        assert_eq!(accessions, vec!["B", "A"]);
    }

    #[test]
    fn equality_ignores_everything_but_accession() {
        let mut other = sample();
        other.name = "Different".into();
        assert_eq!(sample(), other);
    }
}
