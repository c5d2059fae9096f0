//! Reconciliation: rebuilds the search index from PostgreSQL.
//!
//! Repairs drift left by failed publishes or lost events. It only upserts;
//! documents without a matching product are left in place.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use catalog_sync_repository::ProductRepository;

use crate::errors::ReconciliationError;
use crate::updater::IndexUpdater;

/// Default number of products read per page.
pub const DEFAULT_PAGE_SIZE: i64 = 500;

/// Copies every product in the authoritative store into the search index.
pub struct ReconciliationSync {
    repository: Arc<dyn ProductRepository>,
    updater: IndexUpdater,
    page_size: i64,
}

impl ReconciliationSync {
    pub fn new(repository: Arc<dyn ProductRepository>, updater: IndexUpdater) -> Self {
        Self::with_page_size(repository, updater, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(
        repository: Arc<dyn ProductRepository>,
        updater: IndexUpdater,
        page_size: i64,
    ) -> Self {
        Self {
            repository,
            updater,
            page_size: page_size.max(1),
        }
    }

    /// Run one full pass and return the number of documents written.
    ///
    /// Stops at the first read or index failure; the error carries the count
    /// written so far. A pass can be re-run at any time.
    #[instrument(skip(self), fields(page_size = self.page_size))]
    pub async fn run(&self) -> Result<u64, ReconciliationError> {
        info!("Starting reconciliation");

        let mut processed: u64 = 0;
        let mut after = None;

        loop {
            let page = self
                .repository
                .find_page(after, self.page_size)
                .await
                .map_err(|source| ReconciliationError::Store { processed, source })?;

            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id);
            let page_len = page.len();

            for product in &page {
                self.updater
                    .upsert(product)
                    .await
                    .map_err(|source| ReconciliationError::Index { processed, source })?;
                processed += 1;
            }

            debug!(page_len = page_len, processed = processed, "Reconciled page");

            if (page_len as i64) < self.page_size {
                break;
            }
        }

        info!(documents_processed = processed, "Reconciliation complete");
        Ok(processed)
    }
}
