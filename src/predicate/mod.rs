mod compiler;

pub use compiler::{compile_predicate, CompiledPredicate, PredicateError, PredicateValue};
