mod enumerator;

pub use enumerator::{enumerate_combinations, Comparison, CountCondition, ModificationCombination};
