use thiserror::Error;

use super::modification::Modification;

pub const MAX_VARIABLE_MODIFICATIONS: usize = 9;
pub const MAX_STATIC_N_TERMINUS_MODIFICATIONS: usize = 1;
pub const MAX_STATIC_C_TERMINUS_MODIFICATIONS: usize = 1;

#[derive(Debug, Error)]
pub enum ModificationCollectionError {
    #[error(
        "static and variable modification for the same amino acid '{amino_acid}' found: {static_accession} / {variable_accession}"
    )]
    InvalidCombination {
        amino_acid: char,
        static_accession: String,
        variable_accession: String,
    },
    #[error("only {limit} {what} modification(s) are allowed, got {count}")]
    LimitExceeded {
        what: &'static str,
        limit: usize,
        count: usize,
    },
}

/// A validated bundle of [`Modification`]s, split by position/staticness for
/// direct access by the enumerator. Construction enforces the same limits
/// Comet does: at most nine variable modifications in total, and at most one
/// static modification per terminus, plus a hard ban on a static and a
/// variable modification targeting the same amino acid.
#[derive(Debug, Clone)]
pub struct ModificationCollection {
    all: Vec<Modification>,
    variable: Vec<Modification>,
    r#static: Vec<Modification>,
    static_n_terminus: Option<Modification>,
    static_c_terminus: Option<Modification>,
    variable_n_terminus: Vec<Modification>,
    variable_c_terminus: Vec<Modification>,
}

impl ModificationCollection {
    pub fn new(modifications: Vec<Modification>) -> Result<Self, ModificationCollectionError> {
        let mut variable = Vec::new();
        let mut r#static = Vec::new();
        let mut static_n_terminus = None;
        let mut static_c_terminus = None;
        let mut variable_n_terminus = Vec::new();
        let mut variable_c_terminus = Vec::new();
        let mut static_n_terminus_count = 0usize;
        let mut static_c_terminus_count = 0usize;
        let mut variable_count = 0usize;

        for modification in &modifications {
            if modification.is_static && !modification.is_terminus_modification() {
                r#static.push(modification.clone());
            } else if modification.is_static && modification.is_position_n_terminus() {
                r#static.push(modification.clone());
                static_n_terminus_count += 1;
                static_n_terminus = Some(modification.clone());
            } else if modification.is_static && modification.is_position_c_terminus() {
                r#static.push(modification.clone());
                static_c_terminus_count += 1;
                static_c_terminus = Some(modification.clone());
            } else if modification.is_variable() {
                variable.push(modification.clone());
                variable_count += 1;
                if modification.is_position_n_terminus() {
                    variable_n_terminus.push(modification.clone());
                } else if modification.is_position_c_terminus() {
                    variable_c_terminus.push(modification.clone());
                }
            }
        }

        for static_mod in &r#static {
            for variable_mod in &variable {
                if static_mod.amino_acid == variable_mod.amino_acid {
                    return Err(ModificationCollectionError::InvalidCombination {
                        amino_acid: static_mod.amino_acid.one_letter_code,
                        static_accession: static_mod.accession.to_string(),
                        variable_accession: variable_mod.accession.to_string(),
                    });
                }
            }
        }

        if variable_count > MAX_VARIABLE_MODIFICATIONS {
            return Err(ModificationCollectionError::LimitExceeded {
                what: "variable",
                limit: MAX_VARIABLE_MODIFICATIONS,
                count: variable_count,
            });
        }
        if static_n_terminus_count > MAX_STATIC_N_TERMINUS_MODIFICATIONS {
            return Err(ModificationCollectionError::LimitExceeded {
                what: "static n-terminus",
                limit: MAX_STATIC_N_TERMINUS_MODIFICATIONS,
                count: static_n_terminus_count,
            });
        }
        if static_c_terminus_count > MAX_STATIC_C_TERMINUS_MODIFICATIONS {
            return Err(ModificationCollectionError::LimitExceeded {
                what: "static c-terminus",
                limit: MAX_STATIC_C_TERMINUS_MODIFICATIONS,
                count: static_c_terminus_count,
            });
        }

        Ok(Self {
            all: modifications,
            variable,
            r#static,
            static_n_terminus,
            static_c_terminus,
            variable_n_terminus,
            variable_c_terminus,
        })
    }

    pub fn all(&self) -> &[Modification] {
        &self.all
    }

    pub fn variable(&self) -> &[Modification] {
        &self.variable
    }

    pub fn r#static(&self) -> &[Modification] {
        &self.r#static
    }

    pub fn static_n_terminus(&self) -> Option<&Modification> {
        self.static_n_terminus.as_ref()
    }

    pub fn static_c_terminus(&self) -> Option<&Modification> {
        self.static_c_terminus.as_ref()
    }

    pub fn variable_n_terminus(&self) -> &[Modification] {
        &self.variable_n_terminus
    }

    pub fn variable_c_terminus(&self) -> &[Modification] {
        &self.variable_c_terminus
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::{amino_acid, IntegerMass};
    use crate::modification::ModificationPosition;

    fn variable_mod(accession: &'static str, aa: crate::chemistry::AminoAcid) -> Modification {
        Modification::new(accession, "variable", aa, IntegerMass::from_dalton(16.0), false, ModificationPosition::Anywhere)
    }

    fn static_mod(accession: &'static str, aa: crate::chemistry::AminoAcid) -> Modification {
        Modification::new(accession, "static", aa, IntegerMass::from_dalton(57.021464), true, ModificationPosition::Anywhere)
    }

    #[test]
    fn sorts_modifications_by_position_and_staticness() {
        let collection = ModificationCollection::new(vec![
            static_mod("X:1", amino_acid::CYSTEINE),
            variable_mod("X:2", amino_acid::METHIONINE),
        ])
        .unwrap();
        assert_eq!(collection.r#static().len(), 1);
        assert_eq!(collection.variable().len(), 1);
    }

    #[test]
    fn rejects_static_and_variable_on_same_amino_acid() {
        let result = ModificationCollection::new(vec![
            static_mod("X:1", amino_acid::CYSTEINE),
            variable_mod("X:2", amino_acid::CYSTEINE),
        ]);
        assert!(matches!(result, Err(ModificationCollectionError::InvalidCombination { .. })));
    }

    #[test]
    fn rejects_more_than_nine_variable_modifications() {
        let mods: Vec<Modification> = (0..10)
            .map(|i| {
                let accession: &'static str = Box::leak(format!("X:{i}").into_boxed_str());
                variable_mod(accession, amino_acid::METHIONINE)
            })
            .collect();
        let result = ModificationCollection::new(mods);
        assert!(matches!(result, Err(ModificationCollectionError::LimitExceeded { what: "variable", .. })));
    }

    #[test]
    fn rejects_two_static_n_terminus_modifications() {
        let n_term = |accession| {
            Modification::new(accession, "n-term", amino_acid::ALANINE, IntegerMass::ZERO, true, ModificationPosition::NTerminus)
        };
        let result = ModificationCollection::new(vec![n_term("X:1"), n_term("X:2")]);
        assert!(matches!(result, Err(ModificationCollectionError::LimitExceeded { what: "static n-terminus", .. })));
    }
}
