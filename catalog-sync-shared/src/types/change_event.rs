//! Change event envelope carried on the change topic.
//!
//! Events are JSON objects of the form
//! `{"operation": "created" | "updated" | "deleted", "entity": {...}}`.
//! The legacy `{"type": "product_created", "product": {...}}` form is accepted
//! when decoding so that events produced by older writers still apply.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::product::Product;

/// The kind of authoritative write an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Created,
    Updated,
    Deleted,
}

impl Operation {
    /// Wire name of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Created => "created",
            Operation::Updated => "updated",
            Operation::Deleted => "deleted",
        }
    }

    /// Parse a wire name, including the legacy `product_*` names.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created" | "product_created" => Some(Operation::Created),
            "updated" | "product_updated" => Some(Operation::Updated),
            "deleted" | "product_deleted" => Some(Operation::Deleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while decoding an event payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventDecodeError {
    /// The payload is not a valid envelope.
    #[error("Malformed event: {0}")]
    Malformed(String),

    /// The envelope is valid but names an operation this consumer does not know.
    #[error("Unknown event type: {0}")]
    UnknownOperation(String),
}

impl EventDecodeError {
    /// Create a malformed event error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Short machine-readable reason, used for dead-letter headers.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed_event",
            Self::UnknownOperation(_) => "unknown_event_type",
        }
    }
}

#[derive(Serialize)]
struct OutboundEnvelope<'a> {
    operation: &'static str,
    entity: &'a Product,
}

#[derive(Deserialize)]
struct InboundEnvelope {
    #[serde(alias = "type")]
    operation: String,
    #[serde(alias = "product")]
    entity: Product,
}

/// A single change to one product.
///
/// `entity` is the authoritative snapshot after the write; for deletions it is
/// the last state of the purged record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub operation: Operation,
    pub entity: Product,
}

impl ChangeEvent {
    pub fn new(operation: Operation, entity: Product) -> Self {
        Self { operation, entity }
    }

    pub fn created(entity: Product) -> Self {
        Self::new(Operation::Created, entity)
    }

    pub fn updated(entity: Product) -> Self {
        Self::new(Operation::Updated, entity)
    }

    pub fn deleted(entity: Product) -> Self {
        Self::new(Operation::Deleted, entity)
    }

    /// Identity of the product this event concerns.
    pub fn entity_id(&self) -> Uuid {
        self.entity.id
    }

    /// Message key that keeps all events of one product on one partition.
    pub fn partition_key(&self) -> String {
        self.entity.partition_key()
    }

    /// Serialize to the JSON wire format.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&OutboundEnvelope {
            operation: self.operation.as_str(),
            entity: &self.entity,
        })
    }

    /// Deserialize from the JSON wire format.
    pub fn decode(payload: &[u8]) -> Result<Self, EventDecodeError> {
        let envelope: InboundEnvelope = serde_json::from_slice(payload)
            .map_err(|e| EventDecodeError::malformed(e.to_string()))?;

        let operation = Operation::parse(&envelope.operation)
            .ok_or(EventDecodeError::UnknownOperation(envelope.operation))?;

        Ok(Self {
            operation,
            entity: envelope.entity,
        })
    }
}
