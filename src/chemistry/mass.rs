use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Scale factor between a mass in Dalton and its integer representation.
///
/// This is the authoritative precision of the whole system: every mass
/// that ever touches the store has first been rounded to this many
/// decimal digits.
pub const MASS_CONVERT_FACTOR: f64 = 1_000_000_000.0;

/// Mono-isotopic mass of a single hydrogen atom, used for m/z <-> neutral
/// mass conversions.
pub const HYDROGEN_MONO_MASS: f64 = 1.007825035;

/// A mass scaled by [`MASS_CONVERT_FACTOR`] and truncated to an integer.
///
/// All peptide/modification arithmetic in this crate happens on this type
/// instead of a bare `i64`, so that a mass and e.g. a row count can never be
/// added by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IntegerMass(pub i64);

impl IntegerMass {
    pub const ZERO: IntegerMass = IntegerMass(0);

    /// Converts a mass in Dalton into its integer representation.
    pub fn from_dalton(mass: f64) -> Self {
        Self((mass * MASS_CONVERT_FACTOR) as i64)
    }

    /// Converts the integer representation back into Dalton.
    pub fn to_dalton(self) -> f64 {
        self.0 as f64 / MASS_CONVERT_FACTOR
    }

    pub fn raw(self) -> i64 {
        self.0
    }

    /// Computes the absolute half-width of a ppm tolerance window for this
    /// mass, i.e. `self * ppm / 1e6`.
    pub fn ppm_tolerance(self, ppm: i64) -> i64 {
        (self.0 as f64 / 1_000_000.0 * ppm as f64) as i64
    }
}

impl Add for IntegerMass {
    type Output = IntegerMass;
    fn add(self, rhs: Self) -> Self::Output {
        IntegerMass(self.0 + rhs.0)
    }
}

impl AddAssign for IntegerMass {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for IntegerMass {
    type Output = IntegerMass;
    fn sub(self, rhs: Self) -> Self::Output {
        IntegerMass(self.0 - rhs.0)
    }
}

impl SubAssign for IntegerMass {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for IntegerMass {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(IntegerMass::ZERO, |acc, m| acc + m)
    }
}

/// Converts a precursor m/z to the neutral monoisotopic mass of the
/// (de-protonated) peptide, given the charge state `z`.
pub fn mz_to_neutral_mass(m_over_z: f64, z: i32) -> f64 {
    m_over_z * z as f64 - z as f64 * HYDROGEN_MONO_MASS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_integer_representation() {
        let mass = IntegerMass::from_dalton(18.010564700);
        assert_eq!(mass.raw(), 18_010_564_700);
        assert!((mass.to_dalton() - 18.010564700).abs() < 1e-9);
    }

    #[test]
    fn ppm_tolerance_scales_linearly() {
        let mass = IntegerMass(1_325_887_444_084);
        // 5 ppm of ~1325.887444084 Da is about 6.629 mDa
        let tol = mass.ppm_tolerance(5);
        assert!(tol > 6_600_000 && tol < 6_700_000);
    }

    #[test]
    fn mz_to_neutral_mass_matches_formula() {
        let neutral = mz_to_neutral_mass(500.0, 2);
        assert!((neutral - (1000.0 - 2.0 * HYDROGEN_MONO_MASS)).abs() < 1e-6);
    }
}
