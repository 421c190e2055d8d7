use std::collections::HashSet;

use crate::chemistry::amino_acid;

/// Expands every ambiguous residue (B, Z, J) in `sequence` into its
/// concrete resolutions, returning the set of fully disambiguated
/// sequences. A sequence with no ambiguous residues returns a single-entry
/// set containing the sequence unchanged.
pub fn differentiate_ambiguous_sequences(sequence: &str) -> HashSet<String> {
    let mut out = HashSet::new();
    differentiate(sequence.to_string(), 0, &mut out);
    out
}

fn differentiate(sequence: String, position: usize, out: &mut HashSet<String>) {
    if position == sequence.chars().count() {
        out.insert(sequence);
        return;
    }
    let current = sequence.chars().nth(position).expect("position in bounds");
    let resolutions = amino_acid::ambiguous_resolutions(current);
    if resolutions.is_empty() {
        differentiate(sequence, position + 1, out);
        return;
    }
    for resolution in resolutions {
        let mut chars: Vec<char> = sequence.chars().collect();
        chars[position] = resolution.one_letter_code;
        let new_sequence: String = chars.into_iter().collect();
        differentiate(new_sequence, position + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_without_ambiguity_is_unchanged() {
        let result = differentiate_ambiguous_sequences("PEPTIDE");
        assert_eq!(result.len(), 1);
        assert!(result.contains("PEPTIDE"));
    }

    #[test]
    fn single_b_expands_to_two_sequences() {
        let result = differentiate_ambiguous_sequences("AB");
        assert_eq!(result, HashSet::from(["AD".to_string(), "AN".to_string()]));
    }

    #[test]
    fn two_ambiguous_residues_expand_to_four_sequences() {
        let result = differentiate_ambiguous_sequences("BZ");
        assert_eq!(result.len(), 4);
        assert!(result.contains("DE"));
        assert!(result.contains("DQ"));
        assert!(result.contains("NE"));
        assert!(result.contains("NQ"));
    }
}
