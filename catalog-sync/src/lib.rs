//! # Catalog Sync
//!
//! Keeps the product search index consistent with the authoritative
//! PostgreSQL catalog. Writes go to PostgreSQL first, then a change event is
//! published to Kafka; a consumer applies those events to OpenSearch.
//!
//! ## Architecture
//!
//! The write path and the index path are decoupled by the change topic:
//!
//! 1. **Service**: Writes products to PostgreSQL and publishes change events
//! 2. **Publisher**: Sends change events to Kafka, keyed by product id
//! 3. **Consumer**: Polls change events from Kafka and manages offsets
//! 4. **Processor**: Decodes change events
//! 5. **Updater**: Applies upserts and deletes to OpenSearch
//! 6. **Orchestrator**: Runs the consume-apply-commit loop
//! 7. **Reconciliation**: Re-indexes the whole catalog on demand
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`consumer`]: Kafka consumer for change events
//! - [`dead_letter`]: Routing of unprocessable events
//! - [`processor`]: Decodes change events
//! - [`publisher`]: Kafka producer for change events
//! - [`updater`]: Applies changes to the search index
//! - [`orchestrator`]: Coordinates the ingest flow
//! - [`reconciliation`]: Full re-index from PostgreSQL
//! - [`service`]: Catalog write path
//! - [`errors`]: Error types

pub mod config;
pub mod consumer;
pub mod dead_letter;
pub mod errors;
pub mod orchestrator;
pub mod processor;
pub mod publisher;
pub mod reconciliation;
pub mod service;
pub mod updater;

pub use config::{Dependencies, IndexDependencies, Settings};
pub use errors::{
    IndexApplyError, IngestError, PublishError, ReconciliationError, WriteError,
};

use thiserror::Error;

/// Errors that can occur during start-up or while running a binary.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),

    /// Reconciliation error.
    #[error("Reconciliation error: {0}")]
    ReconciliationError(#[from] ReconciliationError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
