use super::mass::IntegerMass;

/// The 22 residues whose occurrences are individually counted on every
/// stored peptide (`a_count` .. `y_count`). `X` (unknown) is deliberately
/// excluded: a sequence containing `X` is never stored.
pub const AMINO_ACIDS_FOR_COUNTING: [char; 22] = [
    'A', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
    'V', 'W', 'Y',
];

/// A single proteinogenic amino acid with its one-letter code and masses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AminoAcid {
    pub name: &'static str,
    pub one_letter_code: char,
    pub three_letter_code: &'static str,
    pub mono_mass: IntegerMass,
    pub average_mass: IntegerMass,
}

macro_rules! amino_acid {
    ($name:literal, $one:literal, $three:literal, $mono:literal, $avg:literal) => {
        AminoAcid {
            name: $name,
            one_letter_code: $one,
            three_letter_code: $three,
            mono_mass: IntegerMass((($mono as f64) * super::mass::MASS_CONVERT_FACTOR) as i64),
            average_mass: IntegerMass((($avg as f64) * super::mass::MASS_CONVERT_FACTOR) as i64),
        }
    };
}

// Masses from https://proteomicsresource.washington.edu/protocols06/masses.php
pub const ALANINE: AminoAcid = amino_acid!("Alanine", 'A', "Ala", 71.037113805, 71.0788);
pub const CYSTEINE: AminoAcid = amino_acid!("Cysteine", 'C', "Cys", 103.009184505, 103.1388);
pub const ASPARTIC_ACID: AminoAcid = amino_acid!("Aspartic acid", 'D', "Asp", 115.026943065, 115.0886);
pub const GLUTAMIC_ACID: AminoAcid = amino_acid!("Glutamic acid", 'E', "Glu", 129.042593135, 129.1155);
pub const PHENYLALANINE: AminoAcid = amino_acid!("Phenylalanine", 'F', "Phe", 147.068413945, 147.1766);
pub const GLYCINE: AminoAcid = amino_acid!("Glycine", 'G', "Gly", 57.021463735, 57.0519);
pub const HISTIDINE: AminoAcid = amino_acid!("Histidine", 'H', "His", 137.058911875, 137.1411);
pub const ISOLEUCINE: AminoAcid = amino_acid!("Isoleucine", 'I', "Ile", 113.084064015, 113.1594);
pub const LYSINE: AminoAcid = amino_acid!("Lysine", 'K', "Lys", 128.094963050, 128.1741);
pub const LEUCINE: AminoAcid = amino_acid!("Leucine", 'L', "Leu", 113.084064015, 113.1594);
pub const METHIONINE: AminoAcid = amino_acid!("Methionine", 'M', "Met", 131.040484645, 131.1926);
pub const ASPARAGINE: AminoAcid = amino_acid!("Asparagine", 'N', "Asn", 114.042927470, 114.1038);
pub const PYRROLYSINE: AminoAcid = amino_acid!("Pyrrolysine", 'O', "Pyl", 237.147726925, 237.29816);
pub const PROLINE: AminoAcid = amino_acid!("Proline", 'P', "Pro", 97.052763875, 97.1167);
pub const GLUTAMINE: AminoAcid = amino_acid!("Glutamine", 'Q', "Gln", 128.05857754, 128.1307);
pub const ARGININE: AminoAcid = amino_acid!("Arginine", 'R', "Arg", 156.101111050, 156.1875);
pub const SERINE: AminoAcid = amino_acid!("Serine", 'S', "Ser", 87.032028435, 87.0782);
pub const THREONINE: AminoAcid = amino_acid!("Threonine", 'T', "Thr", 101.047678505, 101.1051);
pub const SELENOCYSTEINE: AminoAcid = amino_acid!("Selenocysteine", 'U', "SeC", 150.953633405, 150.0379);
pub const VALINE: AminoAcid = amino_acid!("Valine", 'V', "Val", 99.068413945, 99.1326);
pub const TRYPTOPHAN: AminoAcid = amino_acid!("Tryptophan", 'W', "Trp", 186.079312980, 186.2132);
pub const TYROSINE: AminoAcid = amino_acid!("Tyrosine", 'Y', "Tyr", 163.063328575, 163.1760);
/// Marker for an unknown residue. A peptide containing `X` is never stored.
pub const UNKNOWN: AminoAcid = amino_acid!("Unknown Amino Acid", 'X', "Xaa", 0.0, 0.0);

const TABLE: [AminoAcid; 23] = [
    ALANINE, CYSTEINE, ASPARTIC_ACID, GLUTAMIC_ACID, PHENYLALANINE, GLYCINE, HISTIDINE, ISOLEUCINE,
    LYSINE, LEUCINE, METHIONINE, ASPARAGINE, PYRROLYSINE, PROLINE, GLUTAMINE, ARGININE, SERINE,
    THREONINE, SELENOCYSTEINE, VALINE, TRYPTOPHAN, TYROSINE, UNKNOWN,
];

/// Looks up an amino acid by its one-letter code. Unknown codes (including
/// the ambiguous B/Z/J, which are resolved by the digester via
/// [`ambiguous_resolutions`], not here) map to [`UNKNOWN`].
pub fn by_one_letter_code(code: char) -> AminoAcid {
    TABLE
        .iter()
        .find(|aa| aa.one_letter_code == code.to_ascii_uppercase())
        .copied()
        .unwrap_or(UNKNOWN)
}

/// Maps a mass-ambiguous one-letter code to the amino acids it may resolve
/// to: `B` (Asx) to D or N, `Z` (Glx) to E or Q, `J` (Xle) to I or L. Every
/// peptide containing one of these is expanded by the digester into one
/// concrete peptide per combinatorial resolution.
pub fn ambiguous_resolutions(code: char) -> &'static [AminoAcid] {
    match code.to_ascii_uppercase() {
        'B' => &[ASPARTIC_ACID, ASPARAGINE],
        'Z' => &[GLUTAMIC_ACID, GLUTAMINE],
        'J' => &[ISOLEUCINE, LEUCINE],
        _ => &[],
    }
}

pub fn is_ambiguous(code: char) -> bool {
    matches!(code.to_ascii_uppercase(), 'B' | 'Z' | 'J')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_alphabet_has_22_residues() {
        assert_eq!(AMINO_ACIDS_FOR_COUNTING.len(), 22);
        assert!(!AMINO_ACIDS_FOR_COUNTING.contains(&'X'));
    }

    #[test]
    fn unknown_code_resolves_to_unknown_marker() {
        assert_eq!(by_one_letter_code('x'), UNKNOWN);
        assert_eq!(by_one_letter_code('?'), UNKNOWN);
    }

    #[test]
    fn ambiguous_resolutions_are_correct() {
        assert_eq!(ambiguous_resolutions('B'), &[ASPARTIC_ACID, ASPARAGINE]);
        assert_eq!(ambiguous_resolutions('Z'), &[GLUTAMIC_ACID, GLUTAMINE]);
        assert_eq!(ambiguous_resolutions('J'), &[ISOLEUCINE, LEUCINE]);
        assert!(ambiguous_resolutions('A').is_empty());
    }
}
