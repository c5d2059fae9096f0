//! Consumer module for the change topic.
//!
//! The [`Consumer`] trait is the seam between the consume loop and Kafka, so
//! the loop can be driven by an in-memory topic in tests.

mod kafka_consumer;
mod messages;

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::IngestError;

pub use kafka_consumer::KafkaConsumer;
pub use messages::ConsumedMessage;

/// A source of change events with manually managed read positions.
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Join the consumer group for the change topic.
    fn subscribe(&self) -> Result<(), IngestError>;

    /// Wait up to `timeout` for the next message.
    ///
    /// `Ok(None)` means nothing arrived in time.
    async fn poll(&self, timeout: Duration) -> Result<Option<ConsumedMessage>, IngestError>;

    /// Mark `message` as fully processed; the group resumes after it.
    fn commit(&self, message: &ConsumedMessage) -> Result<(), IngestError>;

    /// Move the read position back so `message` is delivered again.
    fn rewind(&self, message: &ConsumedMessage) -> Result<(), IngestError>;
}
