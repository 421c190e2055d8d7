use std::collections::{HashMap, HashSet};

use crate::chemistry::{IntegerMass, PrecursorRange};
use crate::model::Peptide;
use crate::modification::{Modification, ModificationCollection};

/// Ground-truth check for whether some choice of at most `V` variable
/// modifications, plus every mandatory static modification, brings a
/// peptide's mass inside a precursor window. Used to validate the
/// combinatorial enumerator/compiler against brute-force placement, not on
/// any hot query path.
pub struct MassValidator {
    static_anywhere: HashMap<char, Modification>,
    static_n_terminus: Option<Modification>,
    static_c_terminus: Option<Modification>,
    variable_combinations_by_delta: HashMap<i64, Vec<Vec<Modification>>>,
    precursor_range: PrecursorRange,
}

impl MassValidator {
    pub fn new(
        modifications: &ModificationCollection,
        maximum_number_of_variable_modifications: usize,
        precursor_range: PrecursorRange,
    ) -> Self {
        let static_anywhere = modifications
            .r#static()
            .iter()
            .filter(|m| !m.is_terminus_modification())
            .map(|m| (m.amino_acid.one_letter_code, m.clone()))
            .collect();

        Self {
            static_anywhere,
            static_n_terminus: modifications.static_n_terminus().cloned(),
            static_c_terminus: modifications.static_c_terminus().cloned(),
            variable_combinations_by_delta: build_variable_combinations(
                modifications.variable(),
                maximum_number_of_variable_modifications,
            ),
            precursor_range,
        }
    }

    pub fn precursor_range(&self) -> PrecursorRange {
        self.precursor_range
    }

    pub fn set_precursor_range(&mut self, precursor_range: PrecursorRange) {
        self.precursor_range = precursor_range;
    }

    pub fn validate(&self, peptide: &Peptide) -> bool {
        let chars: Vec<char> = peptide.sequence.chars().collect();
        if chars.is_empty() {
            return false;
        }

        let mut static_mass = peptide.mass;
        let mut occupied = vec![false; chars.len()];

        if let Some(modification) = &self.static_n_terminus {
            static_mass += modification.delta;
            occupied[0] = true;
        }
        if let Some(modification) = &self.static_c_terminus {
            static_mass += modification.delta;
            *occupied.last_mut().unwrap() = true;
        }
        for (idx, &residue) in chars.iter().enumerate() {
            if let Some(modification) = self.static_anywhere.get(&residue) {
                static_mass += modification.delta;
                occupied[idx] = true;
            }
        }

        for (&delta, combinations) in &self.variable_combinations_by_delta {
            let candidate_mass = static_mass + IntegerMass(delta);
            if !self.precursor_range.contains(candidate_mass) {
                continue;
            }
            if combinations
                .iter()
                .any(|combination| is_placeable(&chars, &occupied, combination))
            {
                return true;
            }
        }
        false
    }
}

fn is_placeable(chars: &[char], static_occupied: &[bool], combination: &[Modification]) -> bool {
    let mut occupied = static_occupied.to_vec();

    for modification in combination {
        if modification.is_position_n_terminus() {
            if chars[0] != modification.amino_acid.one_letter_code || occupied[0] {
                return false;
            }
            occupied[0] = true;
        } else if modification.is_position_c_terminus() {
            let last = chars.len() - 1;
            if chars[last] != modification.amino_acid.one_letter_code || occupied[last] {
                return false;
            }
            occupied[last] = true;
        } else {
            let position = chars
                .iter()
                .enumerate()
                .position(|(idx, &residue)| residue == modification.amino_acid.one_letter_code && !occupied[idx]);
            match position {
                Some(idx) => occupied[idx] = true,
                None => return false,
            }
        }
    }
    true
}

/// Builds every distinct multiset of up to `max_variable_modifications`
/// variable modifications (at most one per terminus), grouped by total delta
/// mass. Validity of a partial choice is checked against its already-fixed
/// prefix only. Checking the whole working array lets stale entries from
/// sibling branches veto a terminus slot that was never actually chosen on
/// the current path.
fn build_variable_combinations(
    variable: &[Modification],
    max_variable_modifications: usize,
) -> HashMap<i64, Vec<Vec<Modification>>> {
    let mut buckets: HashMap<i64, Vec<Vec<Modification>>> = HashMap::new();
    let mut seen: HashSet<(i64, Vec<String>)> = HashSet::new();

    if max_variable_modifications == 0 || variable.is_empty() {
        buckets.entry(0).or_default().push(Vec::new());
        return buckets;
    }

    let mut slots: Vec<i64> = vec![-1; max_variable_modifications];
    build_recursive(variable, &mut slots, 0, &mut buckets, &mut seen);
    buckets
}

fn build_recursive(
    variable: &[Modification],
    slots: &mut [i64],
    pos: usize,
    buckets: &mut HashMap<i64, Vec<Vec<Modification>>>,
    seen: &mut HashSet<(i64, Vec<String>)>,
) {
    for modification_index in -1..variable.len() as i64 {
        if !is_valid_to_add(variable, &slots[..pos], modification_index) {
            continue;
        }
        slots[pos] = modification_index;

        if pos < slots.len() - 1 {
            build_recursive(variable, slots, pos + 1, buckets, seen);
        } else {
            let chosen: Vec<Modification> = slots
                .iter()
                .filter(|&&idx| idx >= 0)
                .map(|&idx| variable[idx as usize].clone())
                .collect();
            let delta: i64 = chosen.iter().map(|m| m.delta.raw()).sum();
            let mut key: Vec<String> = chosen.iter().map(|m| m.accession.clone()).collect();
            key.sort_unstable();
            if seen.insert((delta, key)) {
                buckets.entry(delta).or_default().push(chosen);
            }
        }
    }
}

fn is_valid_to_add(variable: &[Modification], committed_prefix: &[i64], modification_index: i64) -> bool {
    if modification_index < 0 {
        return true;
    }
    let candidate = &variable[modification_index as usize];
    if candidate.is_position_n_terminus() {
        return !committed_prefix
            .iter()
            .any(|&idx| idx >= 0 && variable[idx as usize].is_position_n_terminus());
    }
    if candidate.is_position_c_terminus() {
        return !committed_prefix
            .iter()
            .any(|&idx| idx >= 0 && variable[idx as usize].is_position_c_terminus());
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::amino_acid;
    use crate::modification::ModificationPosition;

    #[test]
    fn validates_unmodified_peptide_in_window() {
        let collection = ModificationCollection::new(Vec::new()).unwrap();
        let peptide = Peptide::new("MR".to_string(), 0, 0);
        let range = PrecursorRange::new(peptide.mass, 5, 5);
        let validator = MassValidator::new(&collection, 0, range);
        assert!(validator.validate(&peptide));
    }

    #[test]
    fn rejects_peptide_outside_window() {
        let collection = ModificationCollection::new(Vec::new()).unwrap();
        let peptide = Peptide::new("MR".to_string(), 0, 0);
        let range = PrecursorRange::new(peptide.mass + IntegerMass::from_dalton(100.0), 5, 5);
        let validator = MassValidator::new(&collection, 0, range);
        assert!(!validator.validate(&peptide));
    }

    #[test]
    fn finds_placement_for_variable_oxidation() {
        let oxidation = Modification::new(
            "UNIMOD:35",
            "Oxidation",
            amino_acid::METHIONINE,
            IntegerMass::from_dalton(15.994915),
            false,
            ModificationPosition::Anywhere,
        );
        let collection = ModificationCollection::new(vec![oxidation]).unwrap();
        let peptide = Peptide::new("MR".to_string(), 0, 0);
        let range = PrecursorRange::new(peptide.mass + oxidation.delta, 5, 5);
        let validator = MassValidator::new(&collection, 1, range);
        assert!(validator.validate(&peptide));
    }

    #[test]
    fn fails_when_no_matching_residue_for_variable_modification() {
        let oxidation = Modification::new(
            "UNIMOD:35",
            "Oxidation",
            amino_acid::METHIONINE,
            IntegerMass::from_dalton(15.994915),
            false,
            ModificationPosition::Anywhere,
        );
        let collection = ModificationCollection::new(vec![oxidation]).unwrap();
        let peptide = Peptide::new("AR".to_string(), 0, 0);
        let range = PrecursorRange::new(peptide.mass + oxidation.delta, 5, 5);
        let validator = MassValidator::new(&collection, 1, range);
        assert!(!validator.validate(&peptide));
    }

    #[test]
    fn applies_static_modification_unconditionally() {
        let carbamidomethyl = Modification::new(
            "UNIMOD:4",
            "Carbamidomethyl",
            amino_acid::CYSTEINE,
            IntegerMass::from_dalton(57.021464),
            true,
            ModificationPosition::Anywhere,
        );
        let collection = ModificationCollection::new(vec![carbamidomethyl]).unwrap();
        let peptide = Peptide::new("CR".to_string(), 0, 0);
        let range = PrecursorRange::new(peptide.mass + carbamidomethyl.delta, 5, 5);
        let validator = MassValidator::new(&collection, 0, range);
        assert!(validator.validate(&peptide));
    }
}
