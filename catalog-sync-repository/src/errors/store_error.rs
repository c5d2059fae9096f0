use thiserror::Error;

#[derive(Debug, Error)]
/// Represents errors that can occur within the authoritative product store.
///
/// This enum consolidates the database conditions surfaced by SQLx, both for
/// queries and for running the embedded migrations.
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}
