//! Fuzzy listing search
//!
//! Query parsing, per-field fuzzy scoring, weighted ranking and
//! suggestion generation. Everything here is a pure function of its inputs.

pub mod engine;
pub mod error;
pub mod fuzzy;
pub mod parser;
pub mod ranking;
pub mod suggest;
pub mod text;
pub mod types;


pub use engine::SearchEngine;
pub use error::MatchError;
pub use fuzzy::{FuzzyMatcher, MatcherConfig};
pub use parser::{ParsedQuery, QueryParser};
pub use ranking::{FieldWeights, SearchOptions};
pub use suggest::build_dictionary;
pub use types::{MatchResult, SearchField, SearchableRecord, Suggestion, SuggestionKind};
