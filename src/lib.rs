//! estate-search: fuzzy property listing search with an in-process cache
//!
//! - [`search`]: query parsing, fuzzy field scoring, ranking and suggestions
//! - [`cache`]: TTL cache for ranked results and suggestions plus response-time samples
//! - [`service`]: cache-aside search over a [`listing::ListingStore`]
//! - [`server`]: axum HTTP routes over the service

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod listing;
pub mod search;
pub mod server;
pub mod service;
