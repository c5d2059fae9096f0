//! Publisher module: emits change events after authoritative writes.

mod kafka_publisher;

use async_trait::async_trait;

use catalog_sync_shared::{Operation, Product};

use crate::errors::PublishError;

pub use kafka_publisher::KafkaChangePublisher;

/// Sends a change event for a committed write.
///
/// `entity` is the post-write snapshot; for deletions it is the last stored
/// state of the product.
#[async_trait]
pub trait ChangePublisher: Send + Sync {
    async fn publish(&self, operation: Operation, entity: &Product) -> Result<(), PublishError>;
}
