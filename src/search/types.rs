//! Record, result and suggestion types shared by the search modules

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text fields of a record that take part in matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchField {
    Title,
    Description,
    Location,
    PropertyType,
}

impl SearchField {
    /// Every field, in declaration order
    pub const ALL: [SearchField; 4] = [
        SearchField::Title,
        SearchField::Description,
        SearchField::Location,
        SearchField::PropertyType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Description => "description",
            SearchField::Location => "location",
            SearchField::PropertyType => "propertyType",
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record whose text fields can be matched against a query
pub trait SearchableRecord {
    /// Text of a field, or `None` when the record has no such field
    fn field_text(&self, field: SearchField) -> Option<&str>;

    /// Short texts worth offering as search suggestions
    fn suggestion_terms(&self) -> Vec<&str> {
        [SearchField::Title, SearchField::Location, SearchField::PropertyType]
            .into_iter()
            .filter_map(|field| self.field_text(field))
            .collect()
    }
}

/// A scored record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult<R> {
    pub record: R,
    /// Combined score in `[0, 1]`
    pub score: f64,
    /// Fields with a non-zero score, in declaration order
    pub matched_fields: Vec<SearchField>,
}

/// How a suggestion relates to the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionKind {
    /// Same text as the query
    Exact,
    /// Starts with the query
    Prefix,
    /// Contains a query term as a whole word
    Term,
    /// Approximate match only
    Fuzzy,
}

impl SuggestionKind {
    /// Tie-break rank; higher wins at equal score
    pub fn priority(&self) -> u8 {
        match self {
            SuggestionKind::Exact => 3,
            SuggestionKind::Prefix => 2,
            SuggestionKind::Term => 1,
            SuggestionKind::Fuzzy => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub suggestion: String,
    pub score: f64,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
}
