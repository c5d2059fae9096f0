//! One-off reconciliation pass: re-indexes every product from PostgreSQL.

use dotenv::dotenv;
use catalog_sync::{Dependencies, IndexingError};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("catalog_sync=info,catalog_sync_repository=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;

    let deps = Dependencies::new().await?;
    let result = deps.reconciliation().run().await;
    deps.close().await;

    match result {
        Ok(processed) => {
            info!(documents_processed = processed, "Reconciliation finished");
            Ok(())
        }
        Err(e) => {
            error!(
                documents_processed = e.processed(),
                error = %e,
                "Reconciliation stopped early; safe to re-run"
            );
            Err(e.into())
        }
    }
}
