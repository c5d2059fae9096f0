//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsAliasParts, IndicesExistsParts, IndicesPutAliasParts},
    params::Refresh,
    DeleteParts, GetParts, IndexParts, OpenSearch, SearchParts,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};
use url::Url;
use uuid::Uuid;

use catalog_sync_shared::ProductDocument;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::{get_index_settings, IndexConfig};

#[derive(Deserialize)]
struct GetResponseBody {
    #[serde(rename = "_source")]
    source: ProductDocument,
}

#[derive(Deserialize)]
struct SearchResponseBody {
    hits: SearchHits,
}

#[derive(Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: ProductDocument,
}

/// OpenSearch provider implementation.
///
/// Every write is issued with `refresh=true` so it is visible to reads as soon
/// as the call returns.
///
/// # Example
///
/// ```ignore
/// use catalog_sync_repository::opensearch::{IndexConfig, OpenSearchProvider};
///
/// let provider = OpenSearchProvider::new("http://localhost:9200", IndexConfig::default()).await?;
/// provider.ensure_index_exists().await?;
/// provider.upsert_document(&document).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index configuration containing alias and version
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            alias = %index_config.alias,
            version = index_config.version,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Generate the document ID for a product.
    fn document_id(id: &Uuid) -> String {
        id.to_string()
    }

    /// Drain a failed response into an error message.
    async fn failure_body(response: Response) -> String {
        let status = response.status_code();
        let body = response.text().await.unwrap_or_default();
        format!("status {}: {}", status, body)
    }

    async fn create_index(&self, index_name: &str) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index_name))
            .body(get_index_settings())
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        if response.status_code().is_success() {
            info!(index = %index_name, "Created search index");
            return Ok(());
        }

        let body = Self::failure_body(response).await;
        // Another instance may have created it between the existence check and now
        if body.contains("resource_already_exists_exception") {
            debug!(index = %index_name, "Search index already created concurrently");
            return Ok(());
        }

        error!(index = %index_name, body = %body, "Index creation failed");
        Err(SearchIndexError::index_creation(format!(
            "Failed to create index {}: {}",
            index_name, body
        )))
    }

    async fn ensure_alias(&self, index_name: &str) -> Result<(), SearchIndexError> {
        let alias = self.index_config.alias.as_str();

        let response = self
            .client
            .indices()
            .exists_alias(IndicesExistsAliasParts::Name(&[alias]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if response.status_code().is_success() {
            debug!(alias = %alias, "Search index alias exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .put_alias(IndicesPutAliasParts::IndexName(&[index_name], alias))
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        if !response.status_code().is_success() {
            let body = Self::failure_body(response).await;
            error!(alias = %alias, index = %index_name, body = %body, "Alias creation failed");
            return Err(SearchIndexError::index_creation(format!(
                "Failed to point alias {} at {}: {}",
                alias, index_name, body
            )));
        }

        info!(alias = %alias, index = %index_name, "Created search index alias");
        Ok(())
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        let index_name = self.index_config.versioned_index_name();

        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index_name.as_str()]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => debug!(index = %index_name, "Search index exists"),
            404 => self.create_index(&index_name).await?,
            status => {
                return Err(SearchIndexError::connection(format!(
                    "Unexpected status {} checking index {}",
                    status, index_name
                )));
            }
        }

        self.ensure_alias(&index_name).await
    }

    /// Index the full document under its id, replacing any previous version.
    async fn upsert_document(&self, document: &ProductDocument) -> Result<(), SearchIndexError> {
        let doc_id = Self::document_id(&document.id);

        let response = self
            .client
            .index(IndexParts::IndexId(&self.index_config.alias, &doc_id))
            .body(document)
            .refresh(Refresh::True)
            .send()
            .await
            .map_err(|e| SearchIndexError::index(e.to_string()))?;

        if !response.status_code().is_success() {
            let body = Self::failure_body(response).await;
            error!(doc_id = %doc_id, body = %body, "Index request failed");
            return Err(SearchIndexError::index(format!("Index failed with {}", body)));
        }

        debug!(doc_id = %doc_id, "Document indexed");
        Ok(())
    }

    async fn delete_document(&self, id: &Uuid) -> Result<(), SearchIndexError> {
        let doc_id = Self::document_id(id);

        let response = self
            .client
            .delete(DeleteParts::IndexId(&self.index_config.alias, &doc_id))
            .refresh(Refresh::True)
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - document may not exist
        if status.as_u16() == 404 {
            debug!(doc_id = %doc_id, "Document already absent");
            return Ok(());
        }

        if !status.is_success() {
            let body = Self::failure_body(response).await;
            error!(doc_id = %doc_id, body = %body, "Delete request failed");
            return Err(SearchIndexError::delete(format!("Delete failed with {}", body)));
        }

        debug!(doc_id = %doc_id, "Document deleted");
        Ok(())
    }

    async fn get_document(&self, id: &Uuid) -> Result<Option<ProductDocument>, SearchIndexError> {
        let doc_id = Self::document_id(id);

        let response = self
            .client
            .get(GetParts::IndexId(&self.index_config.alias, &doc_id))
            .send()
            .await
            .map_err(|e| SearchIndexError::query(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(None);
        }

        if !status.is_success() {
            let body = Self::failure_body(response).await;
            return Err(SearchIndexError::query(format!("Get failed with {}", body)));
        }

        let body: GetResponseBody = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        Ok(Some(body.source))
    }

    async fn search_all(&self, size: usize) -> Result<Vec<ProductDocument>, SearchIndexError> {
        let response = self
            .client
            .search(SearchParts::Index(&[self.index_config.alias.as_str()]))
            .body(json!({
                "query": {
                    "match_all": {}
                },
                "size": size
            }))
            .send()
            .await
            .map_err(|e| SearchIndexError::query(e.to_string()))?;

        if !response.status_code().is_success() {
            let body = Self::failure_body(response).await;
            return Err(SearchIndexError::query(format!("Search failed with {}", body)));
        }

        let body: SearchResponseBody = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        Ok(body.hits.hits.into_iter().map(|hit| hit.source).collect())
    }
}
