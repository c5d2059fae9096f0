//! Dependency initialization and wiring for the catalog sync binaries.

use std::sync::Arc;
use std::time::Duration;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::time::sleep;
use tracing::{info, warn};

use catalog_sync_repository::opensearch::IndexConfig;
use catalog_sync_repository::postgres::run_migrations;
use catalog_sync_repository::{OpenSearchProvider, PostgresProductRepository, SearchIndexProvider};

use crate::config::{ConnectionMode, Settings};
use crate::consumer::KafkaConsumer;
use crate::dead_letter::KafkaDeadLetterSink;
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::processor::EventProcessor;
use crate::publisher::KafkaChangePublisher;
use crate::reconciliation::ReconciliationSync;
use crate::service::CatalogService;
use crate::updater::IndexUpdater;
use crate::IndexingError;

/// Time allowed for queued change events to drain at shutdown.
const PUBLISHER_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Clients needed by the change consumer loop.
///
/// Only OpenSearch is connected here: the consumer never reads PostgreSQL
/// or publishes change events.
pub struct IndexDependencies {
    pub settings: Settings,
    pub search_provider: Arc<dyn SearchIndexProvider>,
}

impl IndexDependencies {
    /// Initialize the consumer dependencies from environment variables.
    ///
    /// See [`Settings::from_env`] for the variables read.
    ///
    /// # Returns
    ///
    /// * `Ok(IndexDependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails (OpenSearch only fails in fail-fast mode)
    pub async fn new() -> Result<Self, IndexingError> {
        Self::from_settings(Settings::from_env()).await
    }

    /// Connect to OpenSearch and make sure the search index and its alias exist.
    pub async fn from_settings(settings: Settings) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            kafka_broker = %settings.kafka.broker,
            kafka_group_id = %settings.group_id,
            topic = %settings.topic,
            dead_letter_topic = ?settings.dead_letter_topic,
            connection_mode = ?settings.connection_mode,
            retry_interval_secs = settings.retry_interval.as_secs(),
            "Initializing index dependencies"
        );

        // Initialize OpenSearch provider with retry logic
        let search_provider = connect_to_opensearch(
            &settings.opensearch_url,
            settings.index_config.clone(),
            settings.connection_mode,
            settings.retry_interval,
        )
        .await?;

        info!("OpenSearch connection established");

        // Exits if index and alias cannot be created
        search_provider
            .ensure_index_exists()
            .await
            .map_err(|e| IndexingError::config(format!("Failed to ensure index exists: {}", e)))?;

        Ok(Self {
            settings,
            search_provider: Arc::new(search_provider),
        })
    }

    /// Build the change consumer loop, with dead-lettering when a topic is configured.
    pub fn orchestrator(&self) -> Result<Orchestrator, IndexingError> {
        let consumer = KafkaConsumer::new(&self.settings.kafka, &self.settings.group_id, &self.settings.topic)
            .map_err(|e| IndexingError::config(format!("Failed to create Kafka consumer: {}", e)))?;

        info!("Kafka consumer created");

        let mut orchestrator = Orchestrator::with_config(
            Arc::new(consumer),
            EventProcessor::new(),
            self.updater(),
            OrchestratorConfig::from_settings(&self.settings),
        );

        if let Some(topic) = &self.settings.dead_letter_topic {
            let sink = KafkaDeadLetterSink::new(&self.settings.kafka, topic).map_err(|e| {
                IndexingError::config(format!("Failed to create dead-letter sink: {}", e))
            })?;
            orchestrator = orchestrator.with_dead_letter(Arc::new(sink));
        }

        Ok(orchestrator)
    }

    pub fn updater(&self) -> IndexUpdater {
        IndexUpdater::new(self.search_provider.clone())
    }
}

/// Clients for the write path and reconciliation: PostgreSQL, OpenSearch and
/// the change publisher.
pub struct Dependencies {
    pub index: IndexDependencies,
    pub pool: PgPool,
    pub publisher: Arc<KafkaChangePublisher>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    pub async fn new() -> Result<Self, IndexingError> {
        Self::from_settings(Settings::from_env()).await
    }

    /// Connect to PostgreSQL, OpenSearch and Kafka.
    ///
    /// Runs the schema migrations before connecting to OpenSearch.
    pub async fn from_settings(settings: Settings) -> Result<Self, IndexingError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.database_max_connections)
            .connect(&settings.database_url)
            .await
            .map_err(|e| IndexingError::config(format!("Failed to connect to PostgreSQL: {}", e)))?;

        run_migrations(&pool)
            .await
            .map_err(|e| IndexingError::config(format!("Failed to run migrations: {}", e)))?;

        info!("PostgreSQL connection established");

        let publisher = KafkaChangePublisher::new(&settings.kafka, &settings.topic).map_err(|e| {
            IndexingError::config(format!("Failed to create Kafka publisher: {}", e))
        })?;

        let index = IndexDependencies::from_settings(settings).await?;

        Ok(Self {
            index,
            pool,
            publisher: Arc::new(publisher),
        })
    }

    pub fn reconciliation(&self) -> ReconciliationSync {
        ReconciliationSync::with_page_size(
            self.repository(),
            self.index.updater(),
            self.index.settings.reconcile_page_size,
        )
    }

    pub fn catalog_service(&self) -> CatalogService {
        CatalogService::new(self.repository(), self.publisher.clone())
    }

    /// Flush pending change events and close the pool.
    pub async fn close(self) {
        if let Err(e) = self.publisher.flush(PUBLISHER_FLUSH_TIMEOUT) {
            warn!(error = %e, "Failed to flush change publisher");
        }
        self.pool.close().await;
    }

    fn repository(&self) -> Arc<PostgresProductRepository> {
        Arc::new(PostgresProductRepository::new(self.pool.clone()))
    }
}

/// Connect to OpenSearch with retry logic based on connection mode.
async fn connect_to_opensearch(
    url: &str,
    index_config: IndexConfig,
    mode: ConnectionMode,
    retry_interval: Duration,
) -> Result<OpenSearchProvider, IndexingError> {
    loop {
        match OpenSearchProvider::new(url, index_config.clone()).await {
            Ok(provider) => return Ok(provider),
            Err(e) => match mode {
                ConnectionMode::FailFast => {
                    return Err(IndexingError::config(format!(
                        "Failed to connect to OpenSearch: {}",
                        e
                    )));
                }
                ConnectionMode::Retry => {
                    warn!(
                        opensearch_url = %url,
                        error = %e,
                        retry_interval_secs = retry_interval.as_secs(),
                        "Failed to connect to OpenSearch, retrying..."
                    );
                    sleep(retry_interval).await;
                }
            },
        }
    }
}
