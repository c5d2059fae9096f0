//! PostgreSQL implementation of the product repository.
//!
//! Products live in a single `products` table keyed by a UUID assigned at insert.

use async_trait::async_trait;
use uuid::Uuid;

use catalog_sync_shared::{NewProduct, Product, ProductChanges};

use crate::errors::StoreError;
use crate::interfaces::ProductRepository;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: String,
    price: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
        }
    }
}

/// PostgreSQL-backed product repository.
///
/// Each statement runs in its own implicit transaction, so a returned snapshot
/// is always a committed state.
pub struct PostgresProductRepository {
    /// PostgreSQL connection pool
    pool: sqlx::PgPool,
}

impl PostgresProductRepository {
    /// Creates a new PostgreSQL product repository instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool with the `products` table migrated
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn create(&self, product: &NewProduct) -> Result<Product, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO products (id, name, description, price) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, description, price",
        )
        .bind(Uuid::new_v4())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, description, price FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, description, price FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find_page(&self, after: Option<Uuid>, limit: i64) -> Result<Vec<Product>, StoreError> {
        let rows = match after {
            Some(after) => {
                sqlx::query_as::<_, ProductRow>(
                    "SELECT id, name, description, price FROM products WHERE id > $1 \
                     ORDER BY id LIMIT $2",
                )
                .bind(after)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ProductRow>(
                    "SELECT id, name, description, price FROM products ORDER BY id LIMIT $1",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn update(&self, id: Uuid, changes: &ProductChanges) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "UPDATE products SET name = $2, description = $3, price = $4 WHERE id = $1 \
             RETURNING id, name, description, price",
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.price)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "DELETE FROM products WHERE id = $1 RETURNING id, name, description, price",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }
}
