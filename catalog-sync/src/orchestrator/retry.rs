//! Tracks consecutive apply failures per partition.

use std::collections::HashMap;

use crate::consumer::ConsumedMessage;

/// Counts how many times in a row the head of each partition failed.
///
/// Because a failed event is rewound and redelivered before anything after it
/// on the same partition, one entry per partition is enough.
#[derive(Debug, Default)]
pub struct RetryTracker {
    failures: HashMap<(String, i32), (i64, u32)>,
}

impl RetryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed apply and return the attempt number (starting at 1).
    pub fn record_failure(&mut self, message: &ConsumedMessage) -> u32 {
        let entry = self
            .failures
            .entry((message.topic.clone(), message.partition))
            .or_insert((message.offset, 0));

        if entry.0 != message.offset {
            *entry = (message.offset, 0);
        }
        entry.1 += 1;
        entry.1
    }

    /// Forget the failure history of the message's partition.
    pub fn clear(&mut self, message: &ConsumedMessage) {
        self.failures
            .remove(&(message.topic.clone(), message.partition));
    }
}
