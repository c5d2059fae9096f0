//! Kafka consumer implementation for the change topic.

use async_trait::async_trait;
use rdkafka::{
    consumer::{CommitMode, Consumer as _, StreamConsumer},
    Offset, TopicPartitionList,
};
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, info, instrument};

use crate::config::KafkaConfig;
use crate::consumer::{ConsumedMessage, Consumer};
use crate::errors::IngestError;

/// How long a seek may block while rewinding a partition.
const SEEK_TIMEOUT: Duration = Duration::from_secs(1);

/// Kafka consumer for product change events.
///
/// Auto-commit is disabled: offsets are committed one message at a time after
/// the event has been applied.
pub struct KafkaConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaConsumer {
    /// Create a new Kafka consumer.
    ///
    /// # Arguments
    ///
    /// * `kafka` - Broker address and credentials
    /// * `group_id` - Consumer group ID
    /// * `topic` - The change topic to subscribe to
    ///
    /// # Returns
    ///
    /// * `Ok(KafkaConsumer)` - A new consumer instance
    /// * `Err(IngestError)` - If consumer creation fails
    pub fn new(kafka: &KafkaConfig, group_id: &str, topic: &str) -> Result<Self, IngestError> {
        let consumer: StreamConsumer = kafka
            .client_config(group_id)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()
            .map_err(|e| IngestError::kafka(e.to_string()))?;

        info!(
            broker = %kafka.broker,
            group_id = %group_id,
            topic = %topic,
            "Created Kafka consumer"
        );

        Ok(Self {
            consumer,
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl Consumer for KafkaConsumer {
    fn subscribe(&self) -> Result<(), IngestError> {
        self.consumer
            .subscribe(&[self.topic.as_str()])
            .map_err(|e| IngestError::kafka(e.to_string()))?;

        info!(topic = %self.topic, "Subscribed to Kafka topic");
        Ok(())
    }

    async fn poll(&self, timeout: Duration) -> Result<Option<ConsumedMessage>, IngestError> {
        match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_) => Ok(None),
            Ok(Ok(message)) => {
                let message = ConsumedMessage::from_kafka(&message);
                debug!(position = %message, "Received message from Kafka");
                Ok(Some(message))
            }
            Ok(Err(e)) => Err(e.into()),
        }
    }

    #[instrument(skip(self, message), fields(position = %message))]
    fn commit(&self, message: &ConsumedMessage) -> Result<(), IngestError> {
        let mut tpl = TopicPartitionList::new();
        // Kafka expects the offset of the next message to read
        tpl.add_partition_offset(&message.topic, message.partition, Offset::Offset(message.offset + 1))
            .map_err(|e| IngestError::offset(format!("Failed to add offset: {}", e)))?;

        self.consumer
            .commit(&tpl, CommitMode::Async)
            .map_err(|e| IngestError::offset(format!("Failed to commit offsets: {}", e)))?;

        debug!("Committed offset");
        Ok(())
    }

    #[instrument(skip(self, message), fields(position = %message))]
    fn rewind(&self, message: &ConsumedMessage) -> Result<(), IngestError> {
        let seek = || {
            self.consumer.seek(
                &message.topic,
                message.partition,
                Offset::Offset(message.offset),
                SEEK_TIMEOUT,
            )
        };

        // The seek blocks the calling thread; keep it off the async workers
        let result = match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(seek)
            }
            _ => seek(),
        };
        result.map_err(|e| IngestError::offset(format!("Failed to seek: {}", e)))?;

        debug!("Rewound partition for redelivery");
        Ok(())
    }
}
