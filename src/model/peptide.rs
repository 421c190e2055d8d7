use std::hash::{Hash, Hasher};

use crate::chemistry::{amino_acid, peptide_mono_mass, AminoAcid, AMINO_ACIDS_FOR_COUNTING};

/// Per-residue occurrence counts, one slot per entry of
/// [`AMINO_ACIDS_FOR_COUNTING`]. Generated from the sequence rather than
/// enumerated by hand, so a change to the counting alphabet only touches
/// one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResidueCounts([i16; AMINO_ACIDS_FOR_COUNTING.len()]);

impl ResidueCounts {
    pub fn from_sequence(sequence: &str) -> Self {
        let mut counts = [0i16; AMINO_ACIDS_FOR_COUNTING.len()];
        for c in sequence.chars() {
            if let Some(index) = AMINO_ACIDS_FOR_COUNTING.iter().position(|&a| a == c) {
                counts[index] += 1;
            }
        }
        Self(counts)
    }

    /// Count of the given one-letter residue code, or `0` if it is not part
    /// of the counting alphabet.
    pub fn get(&self, one_letter_code: char) -> i16 {
        AMINO_ACIDS_FOR_COUNTING
            .iter()
            .position(|&a| a == one_letter_code.to_ascii_uppercase())
            .map(|index| self.0[index])
            .unwrap_or(0)
    }

    /// Iterates `(column_name, count)` pairs in storage column order, e.g.
    /// `("a_count", 3)`.
    pub fn columns(&self) -> impl Iterator<Item = (String, i16)> + '_ {
        AMINO_ACIDS_FOR_COUNTING
            .iter()
            .zip(self.0.iter())
            .map(|(code, count)| (format!("{}_count", code.to_ascii_lowercase()), *count))
    }
}

/// The canonical, disambiguated, unmodified peptide as stored in the
/// catalog. Primary key: `(partition, mass, sequence)`.
#[derive(Debug, Clone)]
pub struct Peptide {
    pub sequence: String,
    pub length: usize,
    pub number_of_missed_cleavages: usize,
    pub mass: crate::chemistry::IntegerMass,
    pub counts: ResidueCounts,
    pub n_terminus: char,
    pub c_terminus: char,
    pub partition: i32,
    pub is_metadata_up_to_date: bool,
}

impl Peptide {
    /// Builds a peptide from its disambiguated sequence. `partition` must
    /// be resolved against the store's boundary vector by the caller;
    /// this type has no notion of the currently loaded schema.
    pub fn new(sequence: String, number_of_missed_cleavages: usize, partition: i32) -> Self {
        let sequence = sequence.to_ascii_uppercase();
        let mass = peptide_mono_mass(&sequence);
        let counts = ResidueCounts::from_sequence(&sequence);
        let n_terminus = sequence.chars().next().expect("non-empty sequence");
        let c_terminus = sequence.chars().last().expect("non-empty sequence");
        Self {
            length: sequence.chars().count(),
            sequence,
            number_of_missed_cleavages,
            mass,
            counts,
            n_terminus,
            c_terminus,
            partition,
            is_metadata_up_to_date: false,
        }
    }

    pub fn n_terminus_amino_acid(&self) -> AminoAcid {
        amino_acid::by_one_letter_code(self.n_terminus)
    }

    pub fn c_terminus_amino_acid(&self) -> AminoAcid {
        amino_acid::by_one_letter_code(self.c_terminus)
    }

    pub fn to_fasta_entry(&self) -> String {
        format!(">PEPTIDE_{}\n{}\n", self.mass.raw(), self.sequence)
    }
}

impl PartialEq for Peptide {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for Peptide {}

impl Hash for Peptide {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sequence.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_match_sequence() {
        let counts = ResidueCounts::from_sequence("KKAIIILCLIAK");
        assert_eq!(counts.get('K'), 3);
        assert_eq!(counts.get('A'), 2);
        assert_eq!(counts.get('I'), 4);
        assert_eq!(counts.get('C'), 1);
        assert_eq!(counts.get('L'), 2);
        assert_eq!(counts.get('W'), 0);
    }

    #[test]
    fn mass_is_residues_plus_water() {
        let peptide = Peptide::new("MR".to_string(), 0, 0);
        let expected = crate::chemistry::peptide_mono_mass("MR");
        assert_eq!(peptide.mass, expected);
        assert_eq!(peptide.length, 2);
        assert_eq!(peptide.n_terminus, 'M');
        assert_eq!(peptide.c_terminus, 'R');
    }

    #[test]
    fn equality_and_hash_are_sequence_only() {
        let a = Peptide::new("MR".to_string(), 0, 0);
        let b = Peptide::new("MR".to_string(), 2, 7);
        assert_eq!(a, b);
    }
}
