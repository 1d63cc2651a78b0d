//! Property listing records and the listing store interface
//!
//! The real listing store is an external backend. `ListingStore` is the seam
//! the search service talks to; `InMemoryListingStore` backs the CLI, the
//! HTTP server and the tests from a JSON file or a vector.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::cache::key::fold_filter_value;
use crate::cache::SearchFilters;
use crate::error::AppError;
use crate::search::{SearchField, SearchableRecord};

/// A property listing as stored in the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyListing {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Neighbourhood or address line, e.g. "Bandra West"
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub property_type: String,
    #[serde(default)]
    pub price: u64,
    #[serde(default)]
    pub bedrooms: u32,
}

impl SearchableRecord for PropertyListing {
    fn field_text(&self, field: SearchField) -> Option<&str> {
        let text = match field {
            SearchField::Title => &self.title,
            SearchField::Description => &self.description,
            SearchField::Location => &self.location,
            SearchField::PropertyType => &self.property_type,
        };
        (!text.trim().is_empty()).then_some(text.as_str())
    }

    fn suggestion_terms(&self) -> Vec<&str> {
        [
            self.title.as_str(),
            self.location.as_str(),
            self.city.as_str(),
            self.property_type.as_str(),
        ]
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .collect()
    }
}

impl PropertyListing {
    /// Exact/substring filtering used by candidate retrieval
    ///
    /// Ranking never re-applies these filters.
    pub fn matches_filters(&self, filters: &SearchFilters) -> bool {
        if let Some(city) = filters.city() {
            if fold_filter_value(&self.city) != fold_filter_value(city) {
                return false;
            }
        }

        if let Some(location) = filters.location() {
            let haystack = fold_filter_value(&format!("{} {}", self.location, self.city));
            if !haystack.contains(&fold_filter_value(location)) {
                return false;
            }
        }

        if let Some(property_type) = filters.property_type() {
            if fold_filter_value(&self.property_type) != fold_filter_value(property_type) {
                return false;
            }
        }

        if let Some(bedrooms) = filters.bedrooms() {
            if self.bedrooms != bedrooms {
                return false;
            }
        }

        if filters.min_price().is_some_and(|min| self.price < min) {
            return false;
        }

        if filters.max_price().is_some_and(|max| self.price > max) {
            return false;
        }

        true
    }
}

/// Source of candidate listings
///
/// Implementations fetch a superset of plausible matches; relevance ranking
/// happens afterwards in the search engine.
pub trait ListingStore: Send + Sync {
    /// Listings passing the structured filters
    fn fetch_candidates(&self, filters: &SearchFilters) -> Result<Vec<PropertyListing>, AppError>;

    /// Every listing, used to build the suggestion dictionary
    fn all_listings(&self) -> Result<Vec<PropertyListing>, AppError>;
}

/// Listing store held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryListingStore {
    listings: Vec<PropertyListing>,
}

impl InMemoryListingStore {
    pub fn new(listings: Vec<PropertyListing>) -> Self {
        Self { listings }
    }

    /// Load listings from a JSON array file
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let data = std::fs::read_to_string(path)?;
        let listings: Vec<PropertyListing> = serde_json::from_str(&data).map_err(|e| {
            AppError::StoreFailed(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        info!("Loaded {} listings from {}", listings.len(), path.display());
        Ok(Self::new(listings))
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

impl ListingStore for InMemoryListingStore {
    fn fetch_candidates(&self, filters: &SearchFilters) -> Result<Vec<PropertyListing>, AppError> {
        let candidates: Vec<PropertyListing> = self
            .listings
            .iter()
            .filter(|l| l.matches_filters(filters))
            .cloned()
            .collect();

        debug!(
            "Retrieved {} of {} listings as candidates",
            candidates.len(),
            self.listings.len()
        );
        Ok(candidates)
    }

    fn all_listings(&self) -> Result<Vec<PropertyListing>, AppError> {
        Ok(self.listings.clone())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::sample_listings;
    use super::*;
    use std::io::Write;

    #[test]
    fn test_blank_fields_are_absent() {
        let listing = &sample_listings()[0];
        assert_eq!(listing.field_text(SearchField::Title), Some("3 BHK Flat in Mumbai"));
        assert_eq!(listing.field_text(SearchField::Description), None);
        assert_eq!(listing.field_text(SearchField::Location), Some("Andheri West"));
    }

    #[test]
    fn test_suggestion_terms_include_city() {
        let listing = &sample_listings()[1];
        assert_eq!(
            listing.suggestion_terms(),
            vec!["2 BHK Villa in Pune", "Koregaon Park", "Pune", "Villa"]
        );
    }

    #[test]
    fn test_fetch_candidates_filters() {
        let store = InMemoryListingStore::new(sample_listings());

        let all = store.fetch_candidates(&SearchFilters::new()).unwrap();
        assert_eq!(all.len(), 4);

        let mumbai = store
            .fetch_candidates(&SearchFilters::new().with("city", "mumbai"))
            .unwrap();
        assert_eq!(mumbai.len(), 3);

        let three_bhk = store
            .fetch_candidates(&SearchFilters::new().with("bhk", 3).with("city", "Mumbai"))
            .unwrap();
        let ids: Vec<&str> = three_bhk.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        let priced = store
            .fetch_candidates(
                &SearchFilters::new()
                    .with("min_price", 15_000_000)
                    .with("max_price", 30_000_000),
            )
            .unwrap();
        assert_eq!(priced.len(), 2);

        let bandra = store
            .fetch_candidates(&SearchFilters::new().with("location", "bandra"))
            .unwrap();
        assert_eq!(bandra[0].id, "4");

        let villas = store
            .fetch_candidates(&SearchFilters::new().with("property_type", "villa"))
            .unwrap();
        assert_eq!(villas.len(), 1);
    }

    #[test]
    fn test_text_filters_fold_case_not_punctuation() {
        let store = InMemoryListingStore::new(vec![fixtures::listing(
            "n1", "2 BHK in Vashi", "Vashi", "Navi Mumbai", "Apartment", 9_000_000, 2,
        )]);

        let spaced = store
            .fetch_candidates(&SearchFilters::new().with("city", "NAVI MUMBAI"))
            .unwrap();
        assert_eq!(spaced.len(), 1);

        let hyphenated = store
            .fetch_candidates(&SearchFilters::new().with("city", "Navi-Mumbai"))
            .unwrap();
        assert!(hyphenated.is_empty());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "a", "title": "Studio in Goa", "city": "Goa", "price": 4500000, "bedrooms": 1}}]"#
        )
        .unwrap();

        let store = InMemoryListingStore::from_json_file(file.path()).unwrap();
        assert_eq!(store.len(), 1);
        let listing = &store.all_listings().unwrap()[0];
        assert_eq!(listing.city, "Goa");
        assert_eq!(listing.property_type, "");
    }

    #[test]
    fn test_from_json_file_errors() {
        let missing = InMemoryListingStore::from_json_file(Path::new("/nonexistent/listings.json"));
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let invalid = InMemoryListingStore::from_json_file(file.path());
        assert!(matches!(invalid, Err(AppError::StoreFailed(_))));
    }
}
