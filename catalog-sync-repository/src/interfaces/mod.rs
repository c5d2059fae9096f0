//! Interface definitions for the two stores.
//!
//! The traits here allow dependency injection of the backends so the
//! pipeline can be exercised against in-memory mocks.

mod product_repository;
mod search_index_provider;

pub use product_repository::ProductRepository;
pub use search_index_provider::{SearchIndexProvider, DEFAULT_SEARCH_SIZE};
