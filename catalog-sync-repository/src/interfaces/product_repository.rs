use async_trait::async_trait;
use uuid::Uuid;

use catalog_sync_shared::{NewProduct, Product, ProductChanges};

use crate::errors::StoreError;

/// Trait for interacting with the authoritative product store.
///
/// Every method returns only after the write it performs has committed, and
/// write methods return the stored snapshot so callers can publish the exact
/// post-write state.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a product, assigning it a new identity.
    async fn create(&self, product: &NewProduct) -> Result<Product, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    async fn find_all(&self) -> Result<Vec<Product>, StoreError>;

    /// Return up to `limit` products ordered by id, starting after `after`.
    async fn find_page(&self, after: Option<Uuid>, limit: i64) -> Result<Vec<Product>, StoreError>;

    /// Replace the mutable fields of a product. Returns `None` if it does not exist.
    async fn update(&self, id: Uuid, changes: &ProductChanges) -> Result<Option<Product>, StoreError>;

    /// Delete a product, returning the purged snapshot, or `None` if it did not exist.
    async fn delete(&self, id: Uuid) -> Result<Option<Product>, StoreError>;
}
