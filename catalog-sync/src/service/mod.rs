//! Catalog write path.
//!
//! Every write commits to PostgreSQL first and then publishes a change event
//! carrying the stored snapshot.

use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use catalog_sync_repository::ProductRepository;
use catalog_sync_shared::{NewProduct, Operation, Product, ProductChanges};

use crate::errors::WriteError;
use crate::publisher::ChangePublisher;

/// Product CRUD against the authoritative store, with change propagation.
pub struct CatalogService {
    repository: Arc<dyn ProductRepository>,
    publisher: Arc<dyn ChangePublisher>,
}

impl CatalogService {
    pub fn new(repository: Arc<dyn ProductRepository>, publisher: Arc<dyn ChangePublisher>) -> Self {
        Self {
            repository,
            publisher,
        }
    }

    /// Insert a product and publish `created`.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: NewProduct) -> Result<Product, WriteError> {
        let stored = self.repository.create(&product).await?;
        info!(product_id = %stored.id, "Created product");

        self.propagate(Operation::Created, stored).await
    }

    /// Replace a product's fields and publish `updated`.
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Product, WriteError> {
        let stored = self
            .repository
            .update(id, &changes)
            .await?
            .ok_or(WriteError::NotFound(id))?;
        info!("Updated product");

        self.propagate(Operation::Updated, stored).await
    }

    /// Delete a product and publish `deleted` with its last state.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<Product, WriteError> {
        let purged = self
            .repository
            .delete(id)
            .await?
            .ok_or(WriteError::NotFound(id))?;
        info!("Deleted product");

        self.propagate(Operation::Deleted, purged).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Product, WriteError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(WriteError::NotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<Product>, WriteError> {
        Ok(self.repository.find_all().await?)
    }

    async fn propagate(&self, operation: Operation, product: Product) -> Result<Product, WriteError> {
        match self.publisher.publish(operation, &product).await {
            Ok(()) => Ok(product),
            Err(source) => {
                error!(
                    product_id = %product.id,
                    operation = %operation,
                    error = %source,
                    "Write committed but change event was not published; index is stale until reconciliation"
                );
                Err(WriteError::PropagationFailed {
                    operation,
                    product,
                    source,
                })
            }
        }
    }
}
