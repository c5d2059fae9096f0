//! Product document types for the search index.
//!
//! This module defines the document structure that is indexed in the search engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::product::Product;

/// Document representation for the search index.
///
/// The document is a projection of the authoritative `Product` and carries no
/// fields of its own, so indexing the same snapshot twice yields an identical
/// document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductDocument {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
}

impl ProductDocument {
    /// Generate the document ID used in the search index.
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}

impl From<Product> for ProductDocument {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
        }
    }
}

impl From<&Product> for ProductDocument {
    fn from(product: &Product) -> Self {
        product.clone().into()
    }
}

impl From<ProductDocument> for Product {
    fn from(doc: ProductDocument) -> Self {
        Product {
            id: doc.id,
            name: doc.name,
            description: doc.description,
            price: doc.price,
        }
    }
}
