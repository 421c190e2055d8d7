use thiserror::Error;

use crate::enzyme::EnzymeError;
use crate::modification::ModificationCollectionError;
use crate::predicate::PredicateError;
use crate::protein_reader::ParseError;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

/// The crate's top-level error, aggregating every fallible subsystem so the
/// CLI surface has a single type to propagate with `?`. Individual
/// subsystems keep their own focused error enums; this only wraps them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not parse protein record: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    ModificationCollection(#[from] ModificationCollectionError),
    #[error(transparent)]
    Predicate(#[from] PredicateError),
    #[error(transparent)]
    Enzyme(#[from] EnzymeError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("configuration error: {0}")]
    Config(String),
}
