//! Product types for the authoritative store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product as held by the authoritative store.
///
/// `id` is assigned once at creation and never changes; it is the join key
/// between the relational record and its search document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: i64,
}

impl Product {
    /// Create a product snapshot with an existing identity.
    pub fn new(id: Uuid, name: impl Into<String>, description: impl Into<String>, price: i64) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            price,
        }
    }

    /// Key used to route this product's change events to a partition.
    pub fn partition_key(&self) -> String {
        self.id.to_string()
    }
}

/// Input for creating a product. Identity is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: i64,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: i64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price,
        }
    }

    /// Attach an identity, producing the snapshot that will be stored.
    pub fn with_id(self, id: Uuid) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
        }
    }
}

/// Replacement values for the mutable fields of a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: String,
    pub description: String,
    pub price: i64,
}

impl ProductChanges {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: i64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price,
        }
    }
}
