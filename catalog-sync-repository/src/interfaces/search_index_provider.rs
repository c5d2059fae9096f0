//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;
use uuid::Uuid;

use catalog_sync_shared::ProductDocument;

use crate::errors::SearchIndexError;

/// Page size used when listing documents without an explicit size.
pub const DEFAULT_SEARCH_SIZE: usize = 100;

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// Documents are addressed by product id only. Writes replace the whole
/// document, which makes repeated application of the same snapshot a no-op.
///
/// # Index Initialization
///
/// Implementations should call `ensure_index_exists` during application startup to ensure
/// the search index and any aliases are properly configured before performing document operations.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Ensure the search index and any required aliases exist, creating them if necessary.
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError>;

    /// Create or fully replace the document for `document.id`.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was written
    /// * `Err(SearchIndexError)` - If the operation fails
    async fn upsert_document(&self, document: &ProductDocument) -> Result<(), SearchIndexError>;

    /// Delete the document for `id`.
    ///
    /// If the document doesn't exist, the operation is considered successful.
    async fn delete_document(&self, id: &Uuid) -> Result<(), SearchIndexError>;

    /// Fetch the document for `id`, or `None` if the index has no such document.
    async fn get_document(&self, id: &Uuid) -> Result<Option<ProductDocument>, SearchIndexError>;

    /// Return up to `size` documents using a match-all query.
    async fn search_all(&self, size: usize) -> Result<Vec<ProductDocument>, SearchIndexError>;
}
