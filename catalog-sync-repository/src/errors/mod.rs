//! Error types for the catalog sync repository.
//!
//! One error type per backend: `SearchIndexError` for the search index and
//! `StoreError` for the authoritative store.

mod search_index_error;
mod store_error;

pub use search_index_error::SearchIndexError;
pub use store_error::StoreError;
