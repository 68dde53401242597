//! Query construction and execution for raw and augmented searches.

pub mod executor;
pub mod weighted;

pub use executor::{SearchExecutor, SearchReport};
pub use weighted::{KEYWORD_WEIGHT, TermKind, WeightedQueryBuilder, WeightedTerm, synonym_weight};
