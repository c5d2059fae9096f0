//! Error types for the catalog sync pipeline.
//!
//! Each stage of the pipeline has its own error type so that callers can tell
//! a publish failure on the write path apart from failures that stay inside
//! the consumer loop.

use thiserror::Error;
use uuid::Uuid;

use catalog_sync_repository::{SearchIndexError, StoreError};
use catalog_sync_shared::{Operation, Product};

/// Errors that can occur inside the consumer loop.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Kafka-related error.
    #[error("Kafka error: {0}")]
    KafkaError(String),

    /// Failed to commit or rewind the consumer position.
    #[error("Offset error: {0}")]
    OffsetError(String),

    /// Failed to route a message to the dead-letter topic.
    #[error("Dead letter error: {0}")]
    DeadLetterError(String),
}

impl IngestError {
    /// Create a Kafka error.
    pub fn kafka(msg: impl Into<String>) -> Self {
        Self::KafkaError(msg.into())
    }

    /// Create an offset error.
    pub fn offset(msg: impl Into<String>) -> Self {
        Self::OffsetError(msg.into())
    }

    /// Create a dead letter error.
    pub fn dead_letter(msg: impl Into<String>) -> Self {
        Self::DeadLetterError(msg.into())
    }
}

impl From<rdkafka::error::KafkaError> for IngestError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        Self::KafkaError(err.to_string())
    }
}

/// The change topic did not accept an event.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The event could not be serialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The broker rejected the event or did not acknowledge it in time.
    #[error("Transport error: {0}")]
    TransportError(String),
}

impl PublishError {
    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportError(msg.into())
    }
}

impl From<rdkafka::error::KafkaError> for PublishError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        Self::TransportError(err.to_string())
    }
}

/// The search index rejected an upsert or delete.
#[derive(Error, Debug)]
pub enum IndexApplyError {
    #[error("Failed to upsert document {id}: {source}")]
    Upsert {
        id: Uuid,
        #[source]
        source: SearchIndexError,
    },

    #[error("Failed to delete document {id}: {source}")]
    Delete {
        id: Uuid,
        #[source]
        source: SearchIndexError,
    },
}

/// A reconciliation pass stopped early.
///
/// Both variants carry the number of documents written before the failure.
#[derive(Error, Debug)]
pub enum ReconciliationError {
    #[error("Failed to read products after {processed} documents: {source}")]
    Store {
        processed: u64,
        #[source]
        source: StoreError,
    },

    #[error("Failed to index product after {processed} documents: {source}")]
    Index {
        processed: u64,
        #[source]
        source: IndexApplyError,
    },
}

impl ReconciliationError {
    /// Number of documents written before the pass stopped.
    pub fn processed(&self) -> u64 {
        match self {
            Self::Store { processed, .. } | Self::Index { processed, .. } => *processed,
        }
    }
}

/// Errors returned by the catalog write path.
#[derive(Error, Debug)]
pub enum WriteError {
    /// No product with this id exists; nothing was written.
    #[error("Product not found: {0}")]
    NotFound(Uuid),

    /// The authoritative write failed; nothing was published.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The authoritative write committed but its change event was not published.
    ///
    /// The index stays stale for this product until reconciliation runs.
    #[error("Product {} was {operation} but the change event was not published: {source}", product.id)]
    PropagationFailed {
        operation: Operation,
        product: Product,
        #[source]
        source: PublishError,
    },
}

impl WriteError {
    /// The committed snapshot, when the write itself succeeded.
    pub fn committed_product(&self) -> Option<&Product> {
        match self {
            Self::PropagationFailed { product, .. } => Some(product),
            _ => None,
        }
    }
}
