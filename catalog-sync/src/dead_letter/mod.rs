//! Dead-letter routing for events the consumer cannot apply.

mod kafka_sink;

use std::fmt;

use async_trait::async_trait;

use catalog_sync_shared::EventDecodeError;

use crate::consumer::ConsumedMessage;
use crate::errors::{IndexApplyError, IngestError};

pub use kafka_sink::KafkaDeadLetterSink;

/// Why a message was taken out of the change stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadLetterReason {
    /// The payload could not be decoded.
    Malformed(String),
    /// The envelope named an operation this consumer does not handle.
    UnknownEventType(String),
    /// The event kept failing to apply.
    ApplyExhausted { attempts: u32, error: String },
}

impl DeadLetterReason {
    pub fn exhausted(attempts: u32, error: &IndexApplyError) -> Self {
        Self::ApplyExhausted {
            attempts,
            error: error.to_string(),
        }
    }

    /// Short machine-readable code, written to the reason header.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed_event",
            Self::UnknownEventType(_) => "unknown_event_type",
            Self::ApplyExhausted { .. } => "apply_attempts_exhausted",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Self::Malformed(detail) => detail.clone(),
            Self::UnknownEventType(operation) => format!("unknown operation '{}'", operation),
            Self::ApplyExhausted { attempts, error } => {
                format!("failed {} times: {}", attempts, error)
            }
        }
    }
}

impl From<EventDecodeError> for DeadLetterReason {
    fn from(err: EventDecodeError) -> Self {
        match err {
            EventDecodeError::Malformed(detail) => Self::Malformed(detail),
            EventDecodeError::UnknownOperation(operation) => Self::UnknownEventType(operation),
        }
    }
}

impl fmt::Display for DeadLetterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.detail())
    }
}

/// Destination for unprocessable messages.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    /// Store `message` with its original bytes. Returns once the sink has
    /// durably accepted it.
    async fn send(
        &self,
        message: &ConsumedMessage,
        reason: &DeadLetterReason,
    ) -> Result<(), IngestError>;
}
