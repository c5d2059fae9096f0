//! This module defines the core data structures used across the catalog sync pipeline.
//! It re-exports specific types like `Product`, `ProductDocument` and `ChangeEvent`.

pub mod change_event;
pub mod product;
pub mod product_document;

pub use change_event::{ChangeEvent, EventDecodeError, Operation};
pub use product::{NewProduct, Product, ProductChanges};
pub use product_document::ProductDocument;
