//! Updater module: applies change events to the search index.

use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use catalog_sync_repository::{SearchIndexError, SearchIndexProvider};
use catalog_sync_shared::{ChangeEvent, Operation, Product, ProductDocument};

use crate::errors::IndexApplyError;

/// Applies upserts and deletes to the search index.
///
/// Both operations are idempotent: an upsert replaces the whole document and
/// deleting an absent document succeeds. Events can therefore be replayed.
#[derive(Clone)]
pub struct IndexUpdater {
    provider: Arc<dyn SearchIndexProvider>,
}

impl IndexUpdater {
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self { provider }
    }

    /// Write the full document for `product`, replacing any previous version.
    #[instrument(skip(self, product), fields(entity_id = %product.id))]
    pub async fn upsert(&self, product: &Product) -> Result<(), IndexApplyError> {
        let document = ProductDocument::from(product);

        self.provider
            .upsert_document(&document)
            .await
            .map_err(|source| IndexApplyError::Upsert {
                id: product.id,
                source,
            })?;

        debug!("Upserted product document");
        Ok(())
    }

    /// Remove the document for `id`. An absent document is not an error.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), IndexApplyError> {
        match self.provider.delete_document(&id).await {
            Ok(()) | Err(SearchIndexError::DocumentNotFound(_)) => {
                debug!("Deleted product document");
                Ok(())
            }
            Err(source) => Err(IndexApplyError::Delete { id, source }),
        }
    }

    /// Dispatch a change event to the matching index operation.
    pub async fn apply(&self, event: &ChangeEvent) -> Result<(), IndexApplyError> {
        match event.operation {
            Operation::Created | Operation::Updated => self.upsert(&event.entity).await,
            Operation::Deleted => self.delete(event.entity.id).await,
        }
    }
}
