//! Change event processor.

use tracing::{debug, warn};

use catalog_sync_shared::{ChangeEvent, EventDecodeError};

use crate::consumer::ConsumedMessage;

/// Decodes consumed messages into change events.
#[derive(Debug, Clone, Default)]
pub struct EventProcessor;

impl EventProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Decode a single message.
    ///
    /// A message without payload is malformed. A key that disagrees with the
    /// entity id is logged, since per-product ordering depends on it, but the
    /// event is still returned.
    pub fn process(&self, message: &ConsumedMessage) -> Result<ChangeEvent, EventDecodeError> {
        let payload = message
            .payload
            .as_deref()
            .ok_or_else(|| EventDecodeError::malformed("empty payload"))?;

        let event = ChangeEvent::decode(payload)?;

        let expected_key = event.partition_key();
        match message.key_str() {
            Some(key) if key == expected_key => {}
            key => warn!(
                position = %message,
                key = ?key,
                entity_id = %expected_key,
                "Message key does not match entity id"
            ),
        }

        debug!(
            position = %message,
            operation = %event.operation,
            entity_id = %event.entity_id(),
            "Decoded change event"
        );

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_sync_shared::{Operation, Product};
    use uuid::Uuid;

    fn message(key: Option<&str>, payload: Option<&[u8]>) -> ConsumedMessage {
        ConsumedMessage::new(
            "product_events",
            0,
            0,
            key.map(|k| k.as_bytes().to_vec()),
            payload.map(<[u8]>::to_vec),
        )
    }

    #[test]
    fn test_process_created() {
        let product = Product::new(Uuid::new_v4(), "Widget", "A widget", 10);
        let payload = ChangeEvent::created(product.clone()).encode().unwrap();
        let key = product.partition_key();

        let event = EventProcessor::new()
            .process(&message(Some(&key), Some(&payload)))
            .unwrap();

        assert_eq!(event.operation, Operation::Created);
        assert_eq!(event.entity, product);
    }

    #[test]
    fn test_process_mismatched_key_still_decodes() {
        let product = Product::new(Uuid::new_v4(), "Widget", "", 10);
        let payload = ChangeEvent::deleted(product.clone()).encode().unwrap();

        let event = EventProcessor::new()
            .process(&message(Some("other"), Some(&payload)))
            .unwrap();

        assert_eq!(event.operation, Operation::Deleted);
    }

    #[test]
    fn test_process_empty_payload() {
        let result = EventProcessor::new().process(&message(None, None));
        assert!(matches!(result, Err(EventDecodeError::Malformed(_))));
    }

    #[test]
    fn test_process_garbage() {
        let result = EventProcessor::new().process(&message(None, Some(b"{not json")));
        assert!(matches!(result, Err(EventDecodeError::Malformed(_))));
    }

    #[test]
    fn test_process_unknown_operation() {
        let payload = format!(
            r#"{{"operation":"archived","entity":{{"id":"{}","name":"x","description":"","price":1}}}}"#,
            Uuid::new_v4()
        );

        let result = EventProcessor::new().process(&message(None, Some(payload.as_bytes())));
        assert!(matches!(result, Err(EventDecodeError::UnknownOperation(op)) if op == "archived"));
    }
}
