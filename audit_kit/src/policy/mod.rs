//! # Policy Documents
//!
//! Structured projection of key policies and textual relevance matching of
//! identity policies.
//!
//! - `extractor` - statement extraction from key policy documents
//! - `watchlist` - key-management action watch-list for identity policies

pub mod extractor;
pub mod watchlist;

pub use extractor::{extract_statements, ExtractionError};
pub use watchlist::{matched_actions, KEY_MANAGEMENT_WATCHLIST};
