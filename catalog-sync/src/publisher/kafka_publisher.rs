//! Kafka producer for change events.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use tracing::{debug, error, info, instrument};

use catalog_sync_shared::{ChangeEvent, Operation, Product};

use crate::config::KafkaConfig;
use crate::errors::PublishError;
use crate::publisher::ChangePublisher;

/// Client ID reported to the broker.
const PUBLISHER_CLIENT_ID: &str = "catalog-sync-publisher";

/// Broker acknowledgement deadline for a single event, in milliseconds.
const DELIVERY_TIMEOUT_MS: u64 = 5000;

/// Publishes change events to the change topic, keyed by product id.
///
/// All events for one product share a key and therefore a partition, so they
/// are consumed in publish order. Idempotence keeps that order across broker
/// retries.
pub struct KafkaChangePublisher {
    producer: FutureProducer,
    topic: String,
}

impl KafkaChangePublisher {
    /// Create a publisher for `topic`.
    ///
    /// Configures the producer with:
    /// - zstd compression
    /// - bounded buffering
    /// - idempotent delivery with `acks=all`
    /// - SASL/SSL authentication if credentials are provided
    pub fn new(kafka: &KafkaConfig, topic: &str) -> Result<Self, PublishError> {
        let producer: FutureProducer = kafka
            .client_config(PUBLISHER_CLIENT_ID)
            .set("compression.type", "zstd")
            .set("message.timeout.ms", DELIVERY_TIMEOUT_MS.to_string())
            .set("queue.buffering.max.messages", "100000")
            .set("queue.buffering.max.kbytes", "1048576")
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .create()?;

        info!(broker = %kafka.broker, topic = %topic, "Created Kafka change publisher");

        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }

    /// Wait for in-flight events to be delivered.
    pub fn flush(&self, timeout: Duration) -> Result<(), PublishError> {
        self.producer.flush(timeout)?;
        Ok(())
    }
}

#[async_trait]
impl ChangePublisher for KafkaChangePublisher {
    #[instrument(skip(self, entity), fields(entity_id = %entity.id, operation = %operation))]
    async fn publish(&self, operation: Operation, entity: &Product) -> Result<(), PublishError> {
        let event = ChangeEvent::new(operation, entity.clone());
        let payload = event
            .encode()
            .map_err(|e| PublishError::serialization(e.to_string()))?;
        let key = event.partition_key();

        let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);

        match self
            .producer
            .send(record, Duration::from_millis(DELIVERY_TIMEOUT_MS))
            .await
        {
            Ok(delivery) => {
                debug!(delivery = ?delivery, "Change event delivered");
                Ok(())
            }
            Err((e, _)) => {
                error!(error = %e, topic = %self.topic, "Failed to deliver change event");
                Err(PublishError::transport(e.to_string()))
            }
        }
    }
}
