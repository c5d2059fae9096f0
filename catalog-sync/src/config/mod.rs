//! Configuration and dependency wiring.

mod dependencies;
mod kafka;
mod settings;

pub use dependencies::{Dependencies, IndexDependencies};
pub use kafka::KafkaConfig;
pub use settings::{ConnectionMode, Settings};
