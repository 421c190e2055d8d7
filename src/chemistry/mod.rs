pub mod amino_acid;
pub mod mass;
pub mod neutral_loss;
pub mod precursor_range;

pub use amino_acid::{AminoAcid, AMINO_ACIDS_FOR_COUNTING};
pub use mass::IntegerMass;
pub use neutral_loss::NeutralLoss;
pub use precursor_range::PrecursorRange;

/// Sums the mono-isotopic mass of a peptide's residues plus a single water
/// molecule (the condensation product left out of individual residue
/// masses). Ambiguous/unknown codes are the caller's responsibility to
/// reject before reaching this point.
pub fn peptide_mono_mass(sequence: &str) -> IntegerMass {
    sequence
        .chars()
        .map(|c| amino_acid::by_one_letter_code(c).mono_mass)
        .sum::<IntegerMass>()
        + NeutralLoss::Water.mono_mass()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peptide_mass_is_residues_plus_water() {
        // K + water
        let k = amino_acid::LYSINE.mono_mass;
        let expected = k + NeutralLoss::Water.mono_mass();
        assert_eq!(peptide_mono_mass("K"), expected);
    }
}
