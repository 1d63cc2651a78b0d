//! Ranking & Scoring System
//!
//! Per-field weights, search options and the aggregate that turns per-field
//! scores into one record score.

use serde::{Deserialize, Serialize};

use super::error::MatchError;
use super::types::SearchField;

/// Share of the combined score taken by the best weighted field
const MAX_SHARE: f64 = 0.8;

/// Field weights in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(SearchField, f64)>", into = "Vec<(SearchField, f64)>")]
pub struct FieldWeights {
    weights: Vec<(SearchField, f64)>,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            weights: vec![
                (SearchField::Title, 1.0),
                (SearchField::Description, 0.5),
                (SearchField::Location, 0.9),
                (SearchField::PropertyType, 0.7),
            ],
        }
    }
}

impl FieldWeights {
    /// Build weights, validating every entry
    ///
    /// A field listed twice keeps its first weight.
    pub fn new(weights: Vec<(SearchField, f64)>) -> Result<Self, MatchError> {
        let mut deduped: Vec<(SearchField, f64)> = Vec::with_capacity(weights.len());

        for (field, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(MatchError::InvalidWeight { field, weight });
            }
            if !deduped.iter().any(|(f, _)| *f == field) {
                deduped.push((field, weight));
            }
        }

        if !deduped.iter().any(|(_, w)| *w > 0.0) {
            return Err(MatchError::NoPositiveWeight);
        }

        Ok(Self { weights: deduped })
    }

    /// Weight for a single field, zero when unlisted
    pub fn weight(&self, field: SearchField) -> f64 {
        self.weights
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    /// Fields with a positive weight, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (SearchField, f64)> + '_ {
        self.weights.iter().copied().filter(|(_, w)| *w > 0.0)
    }
}

impl TryFrom<Vec<(SearchField, f64)>> for FieldWeights {
    type Error = MatchError;

    fn try_from(weights: Vec<(SearchField, f64)>) -> Result<Self, Self::Error> {
        Self::new(weights)
    }
}

impl From<FieldWeights> for Vec<(SearchField, f64)> {
    fn from(weights: FieldWeights) -> Self {
        weights.weights
    }
}

/// Filtering and truncation applied to ranked results
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Minimum score to keep a result
    pub threshold: f64,
    /// Maximum number of results
    pub max_results: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            max_results: 50,
        }
    }
}

impl SearchOptions {
    pub fn new(threshold: f64, max_results: usize) -> Result<Self, MatchError> {
        let options = Self {
            threshold,
            max_results,
        };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MatchError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }

    /// Whether a score passes the threshold
    pub fn accepts(&self, score: f64) -> bool {
        score >= self.threshold
    }
}

/// Combine `(weight, score)` pairs into one score in `[0, 1]`
///
/// Blend of the weighted maximum and the weighted mean. Both are
/// non-decreasing in every field score, so raising one field never lowers
/// the result.
pub fn combine_scores(scored: &[(f64, f64)]) -> f64 {
    let max_weight = scored.iter().map(|(w, _)| *w).fold(0.0, f64::max);
    let total_weight: f64 = scored.iter().map(|(w, _)| *w).sum();

    if max_weight <= 0.0 {
        return 0.0;
    }

    let weighted_max = scored.iter().map(|(w, s)| w * s).fold(0.0, f64::max) / max_weight;
    let weighted_mean = scored.iter().map(|(w, s)| w * s).sum::<f64>() / total_weight;

    (MAX_SHARE * weighted_max + (1.0 - MAX_SHARE) * weighted_mean).clamp(0.0, 1.0)
}

/// Stable sort, best score first; equal scores keep input order
pub fn sort_by_score_desc<T>(items: &mut [T], score: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
