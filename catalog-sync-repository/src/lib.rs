//! # Catalog Sync Repository
//!
//! This crate provides traits and implementations for the two stores the
//! catalog sync pipeline keeps consistent: the authoritative product store
//! (PostgreSQL) and the search index (OpenSearch). It includes definitions
//! for errors, interfaces, and the concrete backends.

pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod postgres;

pub use errors::{SearchIndexError, StoreError};
pub use interfaces::{ProductRepository, SearchIndexProvider, DEFAULT_SEARCH_SIZE};
pub use opensearch::OpenSearchProvider;
pub use postgres::PostgresProductRepository;
