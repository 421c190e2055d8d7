use std::path::Path;

use csv::ReaderBuilder;

use crate::chemistry::{amino_acid, AminoAcid, IntegerMass};
use crate::error::Result;

/// Where on a peptide a modification may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationPosition {
    Anywhere,
    NTerminus,
    CTerminus,
}

impl ModificationPosition {
    pub fn from_str(position: &str) -> Option<Self> {
        match position.to_ascii_uppercase().as_str() {
            "ANYWHERE" => Some(Self::Anywhere),
            "N_TERMINUS" => Some(Self::NTerminus),
            "C_TERMINUS" => Some(Self::CTerminus),
            _ => None,
        }
    }

    pub fn is_terminus(self) -> bool {
        matches!(self, Self::NTerminus | Self::CTerminus)
    }
}

/// A single named mass shift applicable to occurrences of `amino_acid`,
/// either everywhere in a peptide or only at one of its termini.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    pub accession: String,
    pub name: String,
    pub amino_acid: AminoAcid,
    pub delta: IntegerMass,
    pub is_static: bool,
    pub position: ModificationPosition,
}

impl Modification {
    pub fn new(
        accession: impl Into<String>,
        name: impl Into<String>,
        amino_acid: AminoAcid,
        delta: IntegerMass,
        is_static: bool,
        position: ModificationPosition,
    ) -> Self {
        Self {
            accession: accession.into(),
            name: name.into(),
            amino_acid,
            delta,
            is_static,
            position,
        }
    }

    /// Reads a collection of modifications from a CSV file with columns
    /// `accession, name, amino_acid, delta (Da), is_static ("static" or
    /// "variable"), position ("anywhere", "n_terminus", "c_terminus")`. The
    /// first row is assumed to be a header and is skipped.
    pub fn read_from_csv(path: &Path) -> Result<Vec<Self>> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let mut modifications = Vec::new();
        for record in reader.records() {
            let record = record?;
            let accession = record.get(0).unwrap_or_default().to_string();
            let name = record.get(1).unwrap_or_default().to_string();
            let residue = amino_acid::by_one_letter_code(
                record.get(2).and_then(|s| s.chars().next()).unwrap_or('X'),
            );
            let delta = IntegerMass::from_dalton(record.get(3).unwrap_or("0").parse().unwrap_or(0.0));
            let is_static = record.get(4).unwrap_or("variable").eq_ignore_ascii_case("static");
            let position = ModificationPosition::from_str(record.get(5).unwrap_or("anywhere"))
                .unwrap_or(ModificationPosition::Anywhere);
            modifications.push(Self::new(accession, name, residue, delta, is_static, position));
        }
        Ok(modifications)
    }

    pub fn is_variable(&self) -> bool {
        !self.is_static
    }

    pub fn is_position_n_terminus(&self) -> bool {
        self.position == ModificationPosition::NTerminus
    }

    pub fn is_position_c_terminus(&self) -> bool {
        self.position == ModificationPosition::CTerminus
    }

    pub fn is_terminus_modification(&self) -> bool {
        self.position.is_terminus()
    }

    /// Mono-isotopic mass of the modified residue: the unmodified amino
    /// acid's mass plus this modification's delta.
    pub fn mono_mass(&self) -> IntegerMass {
        self.amino_acid.mono_mass + self.delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::amino_acid;

    #[test]
    fn mono_mass_adds_delta_to_residue_mass() {
        let modification = Modification::new(
            "UNIMOD:21",
            "Phospho",
            amino_acid::SERINE,
            IntegerMass::from_dalton(79.966331),
            false,
            ModificationPosition::Anywhere,
        );
        let expected = amino_acid::SERINE.mono_mass + IntegerMass::from_dalton(79.966331);
        assert_eq!(modification.mono_mass(), expected);
    }

    #[test]
    fn parses_position_strings() {
        assert_eq!(ModificationPosition::from_str("anywhere"), Some(ModificationPosition::Anywhere));
        assert_eq!(ModificationPosition::from_str("N_TERMINUS"), Some(ModificationPosition::NTerminus));
        assert_eq!(ModificationPosition::from_str("c_terminus"), Some(ModificationPosition::CTerminus));
        assert_eq!(ModificationPosition::from_str("nowhere"), None);
    }

    #[test]
    fn terminus_modification_is_detected() {
        let n_term = Modification::new(
            "X:1",
            "N-term label",
            amino_acid::ALANINE,
            IntegerMass::ZERO,
            true,
            ModificationPosition::NTerminus,
        );
        assert!(n_term.is_terminus_modification());
        assert!(n_term.is_position_n_terminus());
        assert!(!n_term.is_position_c_terminus());
    }
}
