use thiserror::Error;

use super::types::SearchField;

/// Contract violations raised by the matcher
///
/// These indicate a caller bug, never bad user input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("Threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),
    #[error("Weight for {field} must be finite and non-negative, got {weight}")]
    InvalidWeight { field: SearchField, weight: f64 },
    #[error("At least one field weight must be positive")]
    NoPositiveWeight,
}
