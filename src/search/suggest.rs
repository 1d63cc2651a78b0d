//! Suggestion dictionary and classification

use std::collections::HashSet;

use super::fuzzy::PreparedField;
use super::parser::ParsedQuery;
use super::text::normalize_text;
use super::types::{SearchableRecord, SuggestionKind};

/// Collect suggestion terms from records
///
/// Terms are de-duplicated by normalized form and keep first-seen order.
pub fn build_dictionary<R: SearchableRecord>(records: &[R]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dictionary = Vec::new();

    for record in records {
        for term in record.suggestion_terms() {
            let normalized = normalize_text(term);
            if normalized.is_empty() || !seen.insert(normalized) {
                continue;
            }
            dictionary.push(term.trim().to_string());
        }
    }

    dictionary
}

/// Decide how a dictionary entry relates to the query
pub fn classify_suggestion(query: &ParsedQuery, entry: &PreparedField) -> SuggestionKind {
    if query.normalized == entry.normalized {
        return SuggestionKind::Exact;
    }

    if !query.normalized.is_empty() && entry.normalized.starts_with(&query.normalized) {
        return SuggestionKind::Prefix;
    }

    let entry_tokens: HashSet<&str> = entry.normalized.split(' ').collect();
    if query.terms.iter().any(|t| entry_tokens.contains(t.as_str())) {
        return SuggestionKind::Term;
    }

    SuggestionKind::Fuzzy
}
