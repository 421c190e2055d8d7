use crate::chemistry::{IntegerMass, PrecursorRange};
use crate::modification::{Modification, ModificationCollection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    GreaterOrEqual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountCondition {
    pub column: String,
    pub comparison: Comparison,
    pub count: i64,
}

/// One fully resolved application of the configured modifications: which
/// residue-count columns must hold, which termini (if any) are pinned to a
/// specific residue, and the mass window implied once the combination's
/// total delta is subtracted from the target precursor.
#[derive(Debug, Clone)]
pub struct ModificationCombination {
    pub count_conditions: Vec<CountCondition>,
    pub n_terminus_residue: Option<char>,
    pub c_terminus_residue: Option<char>,
    pub precursor_range: PrecursorRange,
}

/// Enumerates every combination of the collection's modifications whose
/// total delta mass still leaves room inside the precursor window, honoring
/// the variable-modification cap and the one-static-mod-per-terminus rule.
///
/// When `modifications` is empty the enumerator degenerates to a single
/// combination with no count/terminus conditions, i.e. a plain mass-window
/// predicate.
pub fn enumerate_combinations(
    modifications: &ModificationCollection,
    precursor: IntegerMass,
    lower_tolerance_ppm: i64,
    upper_tolerance_ppm: i64,
    variable_modification_maximum: i64,
) -> Vec<ModificationCombination> {
    let mods = modifications.all();
    if mods.is_empty() {
        return vec![ModificationCombination {
            count_conditions: Vec::new(),
            n_terminus_residue: None,
            c_terminus_residue: None,
            precursor_range: PrecursorRange::new(precursor, lower_tolerance_ppm, upper_tolerance_ppm),
        }];
    }

    let mut counts = vec![0i64; mods.len()];
    let mut combinations = Vec::new();
    build_combinations(
        mods,
        &mut counts,
        0,
        precursor.raw(),
        variable_modification_maximum,
        false,
        false,
        false,
        false,
        precursor,
        lower_tolerance_ppm,
        upper_tolerance_ppm,
        &mut combinations,
    );
    combinations
}

#[allow(clippy::too_many_arguments)]
fn build_combinations(
    mods: &[Modification],
    counts: &mut [i64],
    idx: usize,
    remaining: i64,
    free_variable: i64,
    is_n_terminus_used: bool,
    is_n_terminal_residue_used: bool,
    is_c_terminus_used: bool,
    is_c_terminal_residue_used: bool,
    precursor: IntegerMass,
    lower_ppm: i64,
    upper_ppm: i64,
    out: &mut Vec<ModificationCombination>,
) {
    if idx >= mods.len() {
        return;
    }

    let modification = &mods[idx];
    let mono_mass = modification.mono_mass().raw();

    let max_count = if modification.is_static && !modification.is_terminus_modification() {
        remaining / mono_mass
    } else if modification.is_variable() && !modification.is_terminus_modification() {
        (remaining / mono_mass).min(free_variable)
    } else if modification.is_static && modification.is_position_n_terminus() {
        (if is_n_terminus_used { 0 } else { 1 }).min(remaining / mono_mass)
    } else if modification.is_static && modification.is_position_c_terminus() {
        (if is_c_terminus_used { 0 } else { 1 }).min(remaining / mono_mass)
    } else if modification.is_variable() && modification.is_position_n_terminus() {
        (if is_n_terminal_residue_used || free_variable == 0 { 0 } else { 1 }).min(remaining / mono_mass)
    } else if modification.is_variable() && modification.is_position_c_terminus() {
        (if is_c_terminal_residue_used || free_variable == 0 { 0 } else { 1 }).min(remaining / mono_mass)
    } else {
        0
    };

    let mut precursor_reached = false;

    for count in 0..=max_count {
        for c in counts.iter_mut().skip(idx + 1) {
            *c = 0;
        }

        let next_remaining = remaining - mono_mass * count;

        let mut next_free_variable = free_variable;
        let mut next_n_terminus_used = is_n_terminus_used;
        let mut next_n_terminal_residue_used = is_n_terminal_residue_used;
        let mut next_c_terminus_used = is_c_terminus_used;
        let mut next_c_terminal_residue_used = is_c_terminal_residue_used;

        if next_remaining > 0 {
            counts[idx] = count;

            next_free_variable = if modification.is_static {
                free_variable
            } else {
                free_variable - count
            };

            if modification.is_variable() && modification.is_position_n_terminus() && count > 0 {
                next_n_terminal_residue_used = true;
            } else if modification.is_variable() && modification.is_position_c_terminus() && count > 0 {
                next_c_terminal_residue_used = true;
            } else if modification.is_static && modification.is_position_n_terminus() && count > 0 {
                next_n_terminus_used = true;
            } else if modification.is_static && modification.is_position_c_terminus() && count > 0 {
                next_c_terminus_used = true;
            }

            build_combinations(
                mods,
                counts,
                idx + 1,
                next_remaining,
                next_free_variable,
                next_n_terminus_used,
                next_n_terminal_residue_used,
                next_c_terminus_used,
                next_c_terminal_residue_used,
                precursor,
                lower_ppm,
                upper_ppm,
                out,
            );
        } else {
            precursor_reached = true;
        }

        if idx == mods.len() - 1 || precursor_reached {
            out.push(render_combination(mods, counts, precursor, lower_ppm, upper_ppm));
        }

        if precursor_reached {
            break;
        }
    }
}

fn render_combination(
    mods: &[Modification],
    counts: &[i64],
    precursor: IntegerMass,
    lower_ppm: i64,
    upper_ppm: i64,
) -> ModificationCombination {
    // (residue, total count, is_static), insertion-ordered like the source's dict.
    let mut occurrences: Vec<(char, i64, bool)> = Vec::new();
    let mut n_terminus_modification: Option<(Modification, bool)> = None;
    let mut c_terminus_modification: Option<(Modification, bool)> = None;
    let mut delta_sum = IntegerMass::ZERO;

    for (modification, &count) in mods.iter().zip(counts.iter()) {
        let counted = (modification.is_static && !modification.is_terminus_modification())
            || (modification.is_variable() && count > 0);

        if counted {
            if let Some(entry) = occurrences
                .iter_mut()
                .find(|(code, _, _)| *code == modification.amino_acid.one_letter_code)
            {
                entry.1 += count;
            } else {
                occurrences.push((modification.amino_acid.one_letter_code, count, modification.is_static));
            }

            if modification.is_position_n_terminus() {
                n_terminus_modification = Some((modification.clone(), count > 0));
            }
            if modification.is_position_c_terminus() {
                c_terminus_modification = Some((modification.clone(), count > 0));
            }

            delta_sum += IntegerMass(modification.delta.raw() * count);
        } else if modification.is_static && modification.is_terminus_modification() {
            delta_sum += IntegerMass(modification.delta.raw() * count);
        }
    }

    let count_conditions = occurrences
        .into_iter()
        .map(|(code, count, is_static)| CountCondition {
            column: format!("{}_count", code.to_ascii_lowercase()),
            comparison: if is_static { Comparison::Equal } else { Comparison::GreaterOrEqual },
            count,
        })
        .collect();

    let n_terminus_residue = n_terminus_modification
        .filter(|(m, applied)| m.is_variable() && *applied)
        .map(|(m, _)| m.amino_acid.one_letter_code);
    let c_terminus_residue = c_terminus_modification
        .filter(|(m, applied)| m.is_variable() && *applied)
        .map(|(m, _)| m.amino_acid.one_letter_code);

    ModificationCombination {
        count_conditions,
        n_terminus_residue,
        c_terminus_residue,
        precursor_range: PrecursorRange::new(precursor - delta_sum, lower_ppm, upper_ppm),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::amino_acid;
    use crate::modification::ModificationPosition;

    #[test]
    fn no_modifications_yields_one_plain_window_combination() {
        let collection = ModificationCollection::new(Vec::new()).unwrap();
        let combinations = enumerate_combinations(&collection, IntegerMass::from_dalton(1000.0), 5, 5, 3);
        assert_eq!(combinations.len(), 1);
        assert!(combinations[0].count_conditions.is_empty());
    }

    #[test]
    fn static_modification_requires_exact_count() {
        let carbamidomethyl = Modification::new(
            "UNIMOD:4",
            "Carbamidomethyl",
            amino_acid::CYSTEINE,
            IntegerMass::from_dalton(57.021464),
            true,
            ModificationPosition::Anywhere,
        );
        let collection = ModificationCollection::new(vec![carbamidomethyl]).unwrap();
        // Precursor large enough to host up to 2 applications.
        let precursor = amino_acid::CYSTEINE.mono_mass + carbamidomethyl.delta;
        let precursor = precursor + precursor;
        let combinations = enumerate_combinations(&collection, precursor, 20, 20, 0);
        assert!(combinations
            .iter()
            .any(|c| c.count_conditions.iter().any(|cc| cc.column == "c_count"
                && cc.comparison == Comparison::Equal)));
    }

    #[test]
    fn variable_modification_uses_greater_or_equal() {
        let oxidation = Modification::new(
            "UNIMOD:35",
            "Oxidation",
            amino_acid::METHIONINE,
            IntegerMass::from_dalton(15.994915),
            false,
            ModificationPosition::Anywhere,
        );
        let collection = ModificationCollection::new(vec![oxidation]).unwrap();
        let precursor = amino_acid::METHIONINE.mono_mass + oxidation.delta;
        let combinations = enumerate_combinations(&collection, precursor, 20, 20, 1);
        assert!(combinations.iter().any(|c| c
            .count_conditions
            .iter()
            .any(|cc| cc.column == "m_count" && cc.comparison == Comparison::GreaterOrEqual && cc.count == 1)));
    }

    #[test]
    fn respects_variable_modification_cap() {
        let oxidation = Modification::new(
            "UNIMOD:35",
            "Oxidation",
            amino_acid::METHIONINE,
            IntegerMass::from_dalton(15.994915),
            false,
            ModificationPosition::Anywhere,
        );
        let collection = ModificationCollection::new(vec![oxidation]).unwrap();
        let huge_precursor = IntegerMass::from_dalton(100_000.0);
        let combinations = enumerate_combinations(&collection, huge_precursor, 20, 20, 0);
        // With a cap of zero, no variable modification can ever be applied.
        assert!(combinations
            .iter()
            .all(|c| c.count_conditions.iter().all(|cc| cc.count == 0)));
    }
}
