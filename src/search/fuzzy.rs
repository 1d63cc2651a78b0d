//! Fuzzy Matching Engine
//!
//! Scores a query against a single field of text. Similarity is computed per
//! token with the optimal string alignment distance (Levenshtein plus adjacent
//! transpositions), with a boost for prefixes so partially typed words still
//! match.

use super::parser::{is_stop_word, ParsedQuery, QueryParser};
use super::text::{is_numeric_token, tokenize};

/// Tuning knobs for field scoring
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Token similarities at or below this value count as no match
    pub min_token_similarity: f64,
    /// Share of the field score taken by how much of the field was matched
    pub coverage_weight: f64,
    /// Shortest query token eligible for a prefix match
    pub min_prefix_len: usize,
    /// Similarity of the shortest possible prefix match
    pub prefix_base: f64,
    /// Fraction of the gap to 1.0 closed when the field holds every quoted
    /// phrase; scaled down when it holds only some of them
    pub phrase_boost: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_token_similarity: 0.5,
            coverage_weight: 0.15,
            min_prefix_len: 2,
            prefix_base: 0.7,
            phrase_boost: 0.5,
        }
    }
}

/// A field's text, tokenized once per search
#[derive(Debug, Clone)]
pub struct PreparedField {
    /// Tokens joined by single spaces
    pub normalized: String,
    /// Content tokens used for matching
    terms: Vec<Vec<char>>,
}

impl PreparedField {
    pub fn new(text: &str) -> Self {
        let tokens = tokenize(text);
        let normalized = tokens.join(" ");

        let content: Vec<&String> = tokens.iter().filter(|t| !is_stop_word(t)).collect();
        let terms = if content.is_empty() {
            tokens.iter().map(|t| t.chars().collect()).collect()
        } else {
            content.into_iter().map(|t| t.chars().collect()).collect()
        };

        Self { normalized, terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether a normalized phrase occurs in this field on token boundaries
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        if phrase.is_empty() {
            return false;
        }
        let haystack = format!(" {} ", self.normalized);
        haystack.contains(&format!(" {} ", phrase))
    }
}

/// Fuzzy matcher with configuration
#[derive(Debug, Clone, Default)]
pub struct FuzzyMatcher {
    config: MatcherConfig,
}

impl FuzzyMatcher {
    /// Create a new fuzzy matcher with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fuzzy matcher with custom configuration
    pub fn with_config(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Similarity between a query and a field's text, in `[0, 1]`
    ///
    /// Returns 1.0 for an exact case-insensitive match and 0.0 when either
    /// side has no tokens or no token pair is similar enough.
    pub fn score(&self, query: &str, field: &str) -> f64 {
        let parsed = QueryParser::parse(query);
        self.score_prepared(&parsed, &PreparedField::new(field))
    }

    /// Score an already parsed query against an already tokenized field
    pub fn score_prepared(&self, query: &ParsedQuery, field: &PreparedField) -> f64 {
        if query.is_empty() || field.is_empty() {
            return 0.0;
        }

        if query.normalized == field.normalized {
            return 1.0;
        }

        let mut matched = vec![false; field.terms.len()];
        let mut total = 0.0;

        for term in &query.terms {
            let term: Vec<char> = term.chars().collect();
            let mut best = 0.0;
            let mut best_idx = None;

            for (idx, field_term) in field.terms.iter().enumerate() {
                let sim = self.token_similarity(&term, field_term);
                if sim > best {
                    best = sim;
                    best_idx = Some(idx);
                }
            }

            if let Some(idx) = best_idx {
                matched[idx] = true;
            }
            total += best;
        }

        let term_score = total / query.terms.len() as f64;
        let coverage = matched.iter().filter(|m| **m).count() as f64 / field.terms.len() as f64;
        let weight = self.config.coverage_weight;
        let base = ((1.0 - weight) * term_score + weight * coverage).clamp(0.0, 1.0);

        let boost = self.config.phrase_boost * phrase_share(query, field);
        (base + (1.0 - base) * boost).clamp(0.0, 1.0)
    }

    /// Similarity between two tokens, zero below the configured floor
    pub fn token_similarity(&self, query: &[char], field: &[char]) -> f64 {
        if query.is_empty() || field.is_empty() {
            return 0.0;
        }
        if query == field {
            return 1.0;
        }

        // Numbers (bedroom counts, prices, sectors) only match exactly
        if is_numeric(query) || is_numeric(field) {
            return 0.0;
        }

        let max_len = query.len().max(field.len());
        let edit = 1.0 - osa_distance(query, field) as f64 / max_len as f64;

        let prefix = if query.len() >= self.config.min_prefix_len && field.starts_with(query) {
            let ratio = query.len() as f64 / field.len() as f64;
            self.config.prefix_base + (1.0 - self.config.prefix_base) * ratio
        } else {
            0.0
        };

        let sim = edit.max(prefix);
        if sim > self.config.min_token_similarity {
            sim
        } else {
            0.0
        }
    }
}

/// Fraction of the query's quoted phrases found verbatim in the field
fn phrase_share(query: &ParsedQuery, field: &PreparedField) -> f64 {
    if query.quoted_phrases.is_empty() {
        return 0.0;
    }
    let found = query
        .quoted_phrases
        .iter()
        .filter(|phrase| field.contains_phrase(phrase))
        .count();
    found as f64 / query.quoted_phrases.len() as f64
}

fn is_numeric(token: &[char]) -> bool {
    is_numeric_token(&token.iter().collect::<String>())
}

/// Optimal string alignment distance (restricted Damerau-Levenshtein)
///
/// Counts insertions, deletions, substitutions and transpositions of
/// adjacent characters, each at cost 1.
pub fn osa_distance(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Three rolling rows: i-2, i-1 and i
    let mut prev_prev: Vec<usize> = vec![0; b.len() + 1];
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut value = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);

            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                value = value.min(prev_prev[j - 2] + 1);
            }
            curr[j] = value;
        }
        std::mem::swap(&mut prev_prev, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
