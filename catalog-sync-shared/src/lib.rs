//! # Catalog Sync Shared
//!
//! This crate defines the data structures shared across the catalog sync
//! pipeline: the authoritative `Product` record, the `ProductDocument` stored in
//! the search index, and the `ChangeEvent` envelope carried on the change topic.

pub mod types;

pub use types::change_event::{ChangeEvent, EventDecodeError, Operation};
pub use types::product::{NewProduct, Product, ProductChanges};
pub use types::product_document::ProductDocument;
