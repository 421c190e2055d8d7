use std::collections::HashSet;

use fancy_regex::Regex;
use thiserror::Error;

use super::ambiguity::differentiate_ambiguous_sequences;

#[derive(Debug, Error)]
pub enum EnzymeError {
    #[error("invalid cleavage pattern: {0}")]
    BadPattern(#[from] fancy_regex::Error),
    #[error("minimum peptide length {min} is greater than maximum {max}")]
    BadLengthRange { min: usize, max: usize },
}

/// A single sequence emitted by [`Enzyme::digest`]: its canonical,
/// disambiguated amino-acid sequence and the number of missed cleavages
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DigestedPeptide {
    pub sequence: String,
    pub number_of_missed_cleavages: usize,
}

/// A digestion enzyme, described entirely by data rather than by a trait
/// implementation per enzyme: its cleavage site is a lookaround regular
/// expression over the residue sequence, evaluated the same way regardless
/// of which enzyme produced it.
pub struct Enzyme {
    pub name: String,
    cleavage_pattern: Regex,
    pub max_missed_cleavages: usize,
    pub min_length: usize,
    pub max_length: usize,
}

impl Enzyme {
    pub fn new(
        name: impl Into<String>,
        cleavage_pattern: &str,
        max_missed_cleavages: usize,
        min_length: usize,
        max_length: usize,
    ) -> Result<Self, EnzymeError> {
        if min_length > max_length {
            return Err(EnzymeError::BadLengthRange {
                min: min_length,
                max: max_length,
            });
        }
        Ok(Self {
            name: name.into(),
            cleavage_pattern: Regex::new(cleavage_pattern)?,
            max_missed_cleavages,
            min_length,
            max_length,
        })
    }

    /// Trypsin: cleaves after K or R unless followed by P.
    pub fn trypsin(
        max_missed_cleavages: usize,
        min_length: usize,
        max_length: usize,
    ) -> Result<Self, EnzymeError> {
        Self::new(
            "trypsin",
            "(?<=[KR])(?!P)",
            max_missed_cleavages,
            min_length,
            max_length,
        )
    }

    /// Unspecific cleavage: every residue boundary is a cleavage site, and
    /// missed cleavages are not a meaningful concept (always reported as 0).
    pub fn unspecific(min_length: usize, max_length: usize) -> Result<Self, EnzymeError> {
        Self::new("unspecific", "(?<=.)", 0, min_length, max_length)
    }

    fn split_at_cleavage_sites(&self, sequence: &str) -> Result<Vec<String>, EnzymeError> {
        let mut boundaries: Vec<usize> = Vec::new();
        for m in self.cleavage_pattern.find_iter(sequence) {
            let m = m.map_err(EnzymeError::BadPattern)?;
            boundaries.push(m.start());
        }
        let mut fragments = Vec::with_capacity(boundaries.len() + 1);
        let mut start = 0;
        for boundary in boundaries {
            fragments.push(sequence[start..boundary].to_string());
            start = boundary;
        }
        fragments.push(sequence[start..].to_string());
        Ok(fragments)
    }

    /// Digests `sequence` into the set of sub-sequences reachable with at
    /// most `max_missed_cleavages` missed cleavages and length within
    /// `[min_length, max_length]`. Sequences containing the unknown residue
    /// `X` are dropped; sequences containing ambiguous residues are expanded
    /// into every disambiguation.
    pub fn digest(&self, sequence: &str) -> Result<HashSet<DigestedPeptide>, EnzymeError> {
        let fragments = self.split_at_cleavage_sites(sequence)?;
        let mut peptides = HashSet::new();

        for start_index in 0..fragments.len() {
            let last_index = std::cmp::min(
                start_index + self.max_missed_cleavages,
                fragments.len() - 1,
            );
            let mut candidate = String::new();
            for missed_cleavage_index in start_index..=last_index {
                candidate.push_str(&fragments[missed_cleavage_index]);
                let missed_cleavages = missed_cleavage_index - start_index;
                let length = candidate.chars().count();
                if length < self.min_length || length > self.max_length {
                    continue;
                }
                if candidate.contains('X') {
                    continue;
                }
                peptides.insert(DigestedPeptide {
                    sequence: candidate.clone(),
                    number_of_missed_cleavages: missed_cleavages,
                });
                if candidate.chars().any(crate::chemistry::amino_acid::is_ambiguous) {
                    for disambiguated in differentiate_ambiguous_sequences(&candidate) {
                        peptides.insert(DigestedPeptide {
                            sequence: disambiguated,
                            number_of_missed_cleavages: missed_cleavages,
                        });
                    }
                }
            }
        }
        Ok(peptides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leptin() -> &'static str {
        "KPMRCGPLYRFLWLWPYLSYVEAVPIRKVQDDTKTLIKTIVTRINDISHTQSVSSKQRVTGLDFIPGLHPLLSLSKMDQTLAIYQQILASLPSRNVIQISNDLENLRDLLHLLAASKSCPLPQVRALESLESLGVVLEASLYSTEVVALSRLQGSLQDMLRQLDLSPGC"
    }

    #[test]
    fn trypsin_skips_cleavage_before_proline() {
        let enzyme = Enzyme::trypsin(3, 0, 60).unwrap();
        let peptides = enzyme.digest(leptin()).unwrap();
        assert_eq!(peptides.len(), 62);
        assert!(peptides.contains(&DigestedPeptide {
            sequence: "MDQTLAIYQQILASLPSR".to_string(),
            number_of_missed_cleavages: 0
        }));
        assert!(peptides.contains(&DigestedPeptide {
            sequence: "CGPLYRFLWLWPYLSYVEAVPIRK".to_string(),
            number_of_missed_cleavages: 2
        }));
    }

    #[test]
    fn unknown_residue_excludes_spanning_peptides() {
        let enzyme = Enzyme::trypsin(3, 0, 60).unwrap();
        let with_x = leptin().replacen('M', "X", 1);
        let peptides = enzyme.digest(&with_x).unwrap();
        assert!(peptides.iter().all(|p| !p.sequence.contains('X')));
        assert!(peptides.len() < 62);
    }

    #[test]
    fn unspecific_splits_every_residue_boundary() {
        let enzyme = Enzyme::unspecific(1, 7).unwrap();
        let peptides = enzyme.digest("PEPTIDE").unwrap();
        assert!(peptides.iter().all(|p| p.number_of_missed_cleavages == 0));
        assert!(peptides
            .iter()
            .any(|p| p.sequence == "PEPTIDE" && p.number_of_missed_cleavages == 0));
        assert!(peptides.iter().any(|p| p.sequence == "P"));
    }

    #[test]
    fn ambiguous_residue_is_expanded_alongside_original() {
        let enzyme = Enzyme::unspecific(1, 1).unwrap();
        let peptides = enzyme.digest("B").unwrap();
        assert!(peptides.contains(&DigestedPeptide {
            sequence: "B".to_string(),
            number_of_missed_cleavages: 0
        }));
        assert!(peptides.contains(&DigestedPeptide {
            sequence: "D".to_string(),
            number_of_missed_cleavages: 0
        }));
        assert!(peptides.contains(&DigestedPeptide {
            sequence: "N".to_string(),
            number_of_missed_cleavages: 0
        }));
    }

    #[test]
    fn bad_length_range_is_rejected() {
        assert!(Enzyme::trypsin(0, 10, 5).is_err());
    }
}
