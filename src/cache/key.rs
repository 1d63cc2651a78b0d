//! Search filters and canonical cache keys

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::search::{ParsedQuery, QueryParser};

/// Filters the listing store interprets; any other key is kept verbatim
const TYPED_FILTERS: [&str; 7] = [
    "city",
    "location",
    "property_type",
    "type",
    "bedrooms",
    "min_price",
    "max_price",
];

/// Case folding shared by text filters and their cache keys
pub fn fold_filter_value(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Key/value filters attached to a search
///
/// Keys are trimmed and lower-cased; blank values are dropped. Storage is
/// ordered, so insertion order never changes equality or the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct SearchFilters {
    entries: BTreeMap<String, String>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a filter
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl ToString) {
        let key = key.as_ref().trim().to_lowercase();
        let value = value.to_string().trim().to_string();
        if key.is_empty() || value.is_empty() {
            return;
        }
        // `bhk` and `bedrooms` name the same filter
        let key = if key == "bhk" { "bedrooms".to_string() } else { key };
        self.entries.insert(key, value);
    }

    /// Builder form of [`SearchFilters::insert`]
    pub fn with(mut self, key: impl AsRef<str>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn city(&self) -> Option<&str> {
        self.get("city")
    }

    pub fn location(&self) -> Option<&str> {
        self.get("location")
    }

    pub fn property_type(&self) -> Option<&str> {
        self.get("property_type").or_else(|| self.get("type"))
    }

    pub fn bedrooms(&self) -> Option<u32> {
        self.get("bedrooms").and_then(|v| v.parse().ok())
    }

    pub fn min_price(&self) -> Option<u64> {
        self.get("min_price").and_then(|v| v.parse().ok())
    }

    pub fn max_price(&self) -> Option<u64> {
        self.get("max_price").and_then(|v| v.parse().ok())
    }

    /// Filters as the store applies them
    ///
    /// Text filters are case-folded, numbers are parsed, and values that do
    /// not parse are left out because the store ignores them too.
    pub fn applied(&self) -> BTreeMap<&str, Value> {
        let mut applied: BTreeMap<&str, Value> = self
            .iter()
            .filter(|(key, _)| !TYPED_FILTERS.contains(key))
            .map(|(key, value)| (key, json!(value)))
            .collect();

        let text = [
            ("city", self.city()),
            ("location", self.location()),
            ("property_type", self.property_type()),
        ];
        for (key, value) in text {
            if let Some(value) = value {
                applied.insert(key, json!(fold_filter_value(value)));
            }
        }

        if let Some(bedrooms) = self.bedrooms() {
            applied.insert("bedrooms", json!(bedrooms));
        }
        if let Some(min) = self.min_price() {
            applied.insert("min_price", json!(min));
        }
        if let Some(max) = self.max_price() {
            applied.insert("max_price", json!(max));
        }
        applied
    }
}

impl<K: AsRef<str>, V: ToString> FromIterator<(K, V)> for SearchFilters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Self::new();
        for (key, value) in iter {
            filters.insert(key, value);
        }
        filters
    }
}

impl From<BTreeMap<String, String>> for SearchFilters {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<SearchFilters> for BTreeMap<String, String> {
    fn from(filters: SearchFilters) -> Self {
        filters.entries
    }
}

/// Canonical identity of a search: parsed query plus applied filters
///
/// Two searches share a key only when the matcher and the store would treat
/// them identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a search result list
    pub fn for_search(query: &str, filters: &SearchFilters) -> Self {
        let parsed = QueryParser::parse(query);
        Self(json!({ "q": query_identity(&parsed), "f": filters.applied() }).to_string())
    }

    /// Key for a suggestion list
    pub fn for_suggestions(query: &str) -> Self {
        let parsed = QueryParser::parse(query);
        Self(query_identity(&parsed).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn query_identity(parsed: &ParsedQuery) -> Value {
    json!([parsed.normalized, parsed.terms, parsed.quoted_phrases])
}
