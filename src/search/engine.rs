//! Search Engine Integration
//!
//! Ties together query parsing, fuzzy matching, and ranking
//! to score records and dictionary entries against a query.

use std::collections::HashSet;

use super::error::MatchError;
use super::fuzzy::{FuzzyMatcher, PreparedField};
use super::parser::{ParsedQuery, QueryParser};
use super::ranking::{combine_scores, sort_by_score_desc, FieldWeights, SearchOptions};
use super::suggest::classify_suggestion;
use super::types::{MatchResult, SearchableRecord, Suggestion};

/// Search engine that combines parsing, matching, and ranking
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    fuzzy_matcher: FuzzyMatcher,
    weights: FieldWeights,
}

impl SearchEngine {
    /// Create a new search engine with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create search engine with custom weights
    pub fn with_weights(weights: FieldWeights) -> Self {
        Self {
            fuzzy_matcher: FuzzyMatcher::new(),
            weights,
        }
    }

    pub fn weights(&self) -> &FieldWeights {
        &self.weights
    }

    /// Similarity between a query and one field's text
    pub fn score(&self, query: &str, field: &str) -> f64 {
        self.fuzzy_matcher.score(query, field)
    }

    /// Score one record with the given weights
    pub fn match_record<R>(&self, query: &str, record: &R, weights: &FieldWeights) -> MatchResult<R>
    where
        R: SearchableRecord + Clone,
    {
        let parsed = QueryParser::parse(query);
        self.match_parsed(&parsed, record, weights)
    }

    /// Score every record, keep those above the threshold, best first
    ///
    /// Ties keep the order of `records`.
    pub fn search_records<R>(
        &self,
        query: &str,
        records: &[R],
        options: &SearchOptions,
    ) -> Result<Vec<MatchResult<R>>, MatchError>
    where
        R: SearchableRecord + Clone,
    {
        options.validate()?;

        let parsed = QueryParser::parse(query);
        if parsed.is_empty() || records.is_empty() {
            return Ok(Vec::new());
        }

        let mut results: Vec<MatchResult<R>> = records
            .iter()
            .map(|record| self.match_parsed(&parsed, record, &self.weights))
            .filter(|result| options.accepts(result.score))
            .collect();

        sort_by_score_desc(&mut results, |r| r.score);
        results.truncate(options.max_results);

        Ok(results)
    }

    /// Rank dictionary entries against a partially typed query
    ///
    /// Entries are de-duplicated by normalized form, first occurrence wins.
    /// Ordering is score, then suggestion kind, then dictionary order.
    pub fn generate_suggestions<S: AsRef<str>>(
        &self,
        query: &str,
        dictionary: &[S],
        options: &SearchOptions,
    ) -> Result<Vec<Suggestion>, MatchError> {
        options.validate()?;

        let parsed = QueryParser::parse(query);
        if parsed.is_empty() || dictionary.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut suggestions = Vec::new();

        for entry in dictionary {
            let entry = entry.as_ref();
            let field = PreparedField::new(entry);
            if field.is_empty() || !seen.insert(field.normalized.clone()) {
                continue;
            }

            let score = self.fuzzy_matcher.score_prepared(&parsed, &field);
            if !options.accepts(score) {
                continue;
            }

            suggestions.push(Suggestion {
                suggestion: entry.trim().to_string(),
                score,
                kind: classify_suggestion(&parsed, &field),
            });
        }

        // Kind breaks ties between equal scores
        suggestions.sort_by(|a, b| b.kind.priority().cmp(&a.kind.priority()));
        sort_by_score_desc(&mut suggestions, |s| s.score);
        suggestions.truncate(options.max_results);

        Ok(suggestions)
    }

    fn match_parsed<R>(&self, parsed: &ParsedQuery, record: &R, weights: &FieldWeights) -> MatchResult<R>
    where
        R: SearchableRecord + Clone,
    {
        let fields: Vec<_> = weights
            .fields()
            .filter_map(|(field, weight)| {
                let prepared = PreparedField::new(record.field_text(field)?);
                (!prepared.is_empty()).then_some((field, weight, prepared))
            })
            .collect();

        if parsed.is_empty() {
            return MatchResult {
                record: record.clone(),
                score: 0.0,
                matched_fields: Vec::new(),
            };
        }

        let mut scored = Vec::with_capacity(fields.len());
        let mut matched_fields = Vec::new();

        for (field, weight, prepared) in &fields {
            let score = self.fuzzy_matcher.score_prepared(parsed, prepared);
            if score > 0.0 {
                matched_fields.push(*field);
            }
            scored.push((*weight, score));
        }

        MatchResult {
            record: record.clone(),
            score: combine_scores(&scored),
            matched_fields,
        }
    }
}
