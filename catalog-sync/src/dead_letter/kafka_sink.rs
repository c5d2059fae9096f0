//! Kafka-backed dead-letter sink.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use tracing::{info, warn};

use crate::config::KafkaConfig;
use crate::consumer::ConsumedMessage;
use crate::dead_letter::{DeadLetterReason, DeadLetterSink};
use crate::errors::IngestError;

const DEAD_LETTER_CLIENT_ID: &str = "catalog-sync-dead-letter";

const DELIVERY_TIMEOUT_MS: u64 = 5000;

/// Copies unprocessable messages to a dead-letter topic.
///
/// The original key and payload are kept as-is; provenance and the failure
/// reason travel in `x-*` headers.
pub struct KafkaDeadLetterSink {
    producer: FutureProducer,
    topic: String,
}

impl KafkaDeadLetterSink {
    pub fn new(kafka: &KafkaConfig, topic: &str) -> Result<Self, IngestError> {
        let producer: FutureProducer = kafka
            .client_config(DEAD_LETTER_CLIENT_ID)
            .set("compression.type", "zstd")
            .set("message.timeout.ms", DELIVERY_TIMEOUT_MS.to_string())
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .create()?;

        info!(broker = %kafka.broker, topic = %topic, "Created Kafka dead-letter sink");

        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }

    fn headers(message: &ConsumedMessage, reason: &DeadLetterReason) -> OwnedHeaders {
        let detail = reason.detail();
        let partition = message.partition.to_string();
        let offset = message.offset.to_string();
        let dead_lettered_at = Utc::now().to_rfc3339();

        OwnedHeaders::new()
            .insert(Header {
                key: "x-dead-letter-reason",
                value: Some(reason.code()),
            })
            .insert(Header {
                key: "x-dead-letter-detail",
                value: Some(detail.as_str()),
            })
            .insert(Header {
                key: "x-original-topic",
                value: Some(message.topic.as_str()),
            })
            .insert(Header {
                key: "x-original-partition",
                value: Some(partition.as_str()),
            })
            .insert(Header {
                key: "x-original-offset",
                value: Some(offset.as_str()),
            })
            .insert(Header {
                key: "x-dead-lettered-at",
                value: Some(dead_lettered_at.as_str()),
            })
    }
}

#[async_trait]
impl DeadLetterSink for KafkaDeadLetterSink {
    async fn send(
        &self,
        message: &ConsumedMessage,
        reason: &DeadLetterReason,
    ) -> Result<(), IngestError> {
        let mut record: FutureRecord<'_, [u8], [u8]> =
            FutureRecord::to(&self.topic).headers(Self::headers(message, reason));
        if let Some(key) = message.key.as_deref() {
            record = record.key(key);
        }
        if let Some(payload) = message.payload.as_deref() {
            record = record.payload(payload);
        }

        match self
            .producer
            .send(record, Duration::from_millis(DELIVERY_TIMEOUT_MS))
            .await
        {
            Ok(_) => {
                warn!(
                    position = %message,
                    dead_letter_topic = %self.topic,
                    reason = %reason,
                    "Routed message to dead-letter topic"
                );
                Ok(())
            }
            Err((e, _)) => Err(IngestError::dead_letter(format!(
                "Failed to dead-letter {}: {}",
                message, e
            ))),
        }
    }
}
