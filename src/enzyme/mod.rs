mod ambiguity;
mod enzyme;

pub use ambiguity::differentiate_ambiguous_sequences;
pub use enzyme::{DigestedPeptide, Enzyme, EnzymeError};
