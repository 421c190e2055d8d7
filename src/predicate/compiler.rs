use std::collections::HashMap;

use thiserror::Error;

use crate::chemistry::AMINO_ACIDS_FOR_COUNTING;
use crate::combination::{Comparison, CountCondition, ModificationCombination};
use crate::model::maintenance_information::PartitionBoundary;

/// A single bound value for a `?` placeholder in a compiled predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateValue {
    Mass(i64),
    Count(i64),
    Residue(char),
}

#[derive(Debug, Error)]
pub enum PredicateError {
    /// Can only happen if the compiler itself is wrong; every code path
    /// above this one is responsible for keeping values and placeholders in
    /// lockstep.
    #[error("compiler bug: {placeholders} placeholders but {values} bound values")]
    PlaceholderCountMismatch { placeholders: usize, values: usize },
}

#[derive(Debug, Clone)]
pub struct CompiledPredicate {
    pub sql: String,
    pub values: Vec<PredicateValue>,
    pub partitions: Option<Vec<i32>>,
}

/// Compiles a disjunction of combinations into a single parameterised WHERE
/// expression, `OR`-joining one `AND` clause per combination. Column order
/// inside each clause follows the storage's composite index (mass, then the
/// 22 count columns in alphabet order, then termini) so the store's range
/// scan stays index-prefix-satisfied.
///
/// When `partition_boundaries` is given, also derives the set of partitions
/// whose interval intersects any combination's mass window, letting the
/// store prune partitions before it even opens the index.
pub fn compile_predicate(
    combinations: &[ModificationCombination],
    partition_boundaries: Option<&[PartitionBoundary]>,
) -> Result<CompiledPredicate, PredicateError> {
    let mut clauses = Vec::with_capacity(combinations.len());
    let mut values = Vec::new();

    for combination in combinations {
        let (clause, mut clause_values) = compile_combination(combination);
        clauses.push(clause);
        values.append(&mut clause_values);
    }

    let sql = clauses.join(" OR ");
    let placeholders = sql.matches('?').count();
    debug_assert_eq!(placeholders, values.len(), "placeholder/value count mismatch");
    if placeholders != values.len() {
        return Err(PredicateError::PlaceholderCountMismatch {
            placeholders,
            values: values.len(),
        });
    }

    let partitions = partition_boundaries.map(|boundaries| {
        let mut matching: Vec<i32> = boundaries
            .iter()
            .filter(|boundary| {
                combinations.iter().any(|combination| {
                    let window = combination.precursor_range;
                    boundary.lower < window.upper_limit.raw() && window.lower_limit.raw() < boundary.upper
                })
            })
            .map(|boundary| boundary.partition)
            .collect();
        matching.sort_unstable();
        matching.dedup();
        matching
    });

    Ok(CompiledPredicate { sql, values, partitions })
}

fn compile_combination(combination: &ModificationCombination) -> (String, Vec<PredicateValue>) {
    let mut clause = String::from("(mass BETWEEN ? AND ?");
    let mut values = vec![
        PredicateValue::Mass(combination.precursor_range.lower_limit.raw()),
        PredicateValue::Mass(combination.precursor_range.upper_limit.raw()),
    ];

    let by_column: HashMap<&str, &CountCondition> = combination
        .count_conditions
        .iter()
        .map(|condition| (condition.column.as_str(), condition))
        .collect();

    for residue in AMINO_ACIDS_FOR_COUNTING {
        let column = format!("{}_count", residue.to_ascii_lowercase());
        if let Some(condition) = by_column.get(column.as_str()) {
            let operator = match condition.comparison {
                Comparison::Equal => "=",
                Comparison::GreaterOrEqual => ">=",
            };
            clause.push_str(&format!(" AND {column} {operator} ?"));
            values.push(PredicateValue::Count(condition.count));
        }
    }

    if let Some(residue) = combination.n_terminus_residue {
        clause.push_str(" AND n_terminus = ?");
        values.push(PredicateValue::Residue(residue));
    }
    if let Some(residue) = combination.c_terminus_residue {
        clause.push_str(" AND c_terminus = ?");
        values.push(PredicateValue::Residue(residue));
    }

    clause.push(')');
    (clause, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::IntegerMass;
    use crate::combination::enumerate_combinations;
    use crate::modification::ModificationCollection;

    #[test]
    fn degenerate_case_is_a_plain_mass_window() {
        let collection = ModificationCollection::new(Vec::new()).unwrap();
        let combinations = enumerate_combinations(&collection, IntegerMass::from_dalton(1000.0), 5, 5, 0);
        let compiled = compile_predicate(&combinations, None).unwrap();
        assert_eq!(compiled.sql, "(mass BETWEEN ? AND ?)");
        assert_eq!(compiled.values.len(), 2);
    }

    #[test]
    fn placeholder_count_matches_value_count() {
        let collection = ModificationCollection::new(Vec::new()).unwrap();
        let combinations = enumerate_combinations(&collection, IntegerMass::from_dalton(1000.0), 5, 5, 0);
        let compiled = compile_predicate(&combinations, None).unwrap();
        assert_eq!(compiled.sql.matches('?').count(), compiled.values.len());
    }

    #[test]
    fn partition_filter_selects_intersecting_ranges_only() {
        let collection = ModificationCollection::new(Vec::new()).unwrap();
        let combinations = enumerate_combinations(&collection, IntegerMass(1_000), 0, 0, 0);
        let boundaries = vec![
            PartitionBoundary { partition: 0, lower: 0, upper: 500 },
            PartitionBoundary { partition: 1, lower: 500, upper: 1500 },
            PartitionBoundary { partition: 2, lower: 1500, upper: 2000 },
        ];
        let compiled = compile_predicate(&combinations, Some(&boundaries)).unwrap();
        assert_eq!(compiled.partitions, Some(vec![1]));
    }
}
