//! PostgreSQL implementation of the authoritative product store.

mod product_repository;

pub use product_repository::PostgresProductRepository;

use crate::errors::StoreError;

/// Run the embedded schema migrations against `pool`.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("src/postgres/migrations").run(pool).await?;
    Ok(())
}
