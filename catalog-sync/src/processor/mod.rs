//! Processor module for the change consumer.
//!
//! Turns raw consumed messages into change events ready to be applied.

mod event_processor;

pub use event_processor::EventProcessor;
