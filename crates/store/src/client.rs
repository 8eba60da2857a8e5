//! HTTP client for the Elasticsearch-compatible document store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info};

use funnel_core::config::StoreConfig;
use funnel_core::Document;

use crate::error::StoreError;
use crate::index::MAPPING_TEMPLATE;

/// Store operations the pipeline needs.
#[async_trait]
pub trait DocStore: Send + Sync {
    /// Previously stored document under `id`; None when the store holds none.
    async fn fetch(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Write `doc` under `id`, creating or replacing it.
    async fn upsert(&self, id: &str, doc: &Document) -> Result<(), StoreError>;

    /// Write `doc` under a store-assigned id.
    async fn insert(&self, doc: &Document) -> Result<(), StoreError>;

    /// Distinct values of `field`, via a terms aggregation.
    async fn terms(&self, field: &str, size: usize) -> Result<Vec<String>, StoreError>;

    /// Verify the index exists, creating it with the bundled mapping when
    /// allowed to.
    async fn ensure_index(&self, create_missing: bool) -> Result<(), StoreError>;
}

pub struct HttpDocStore {
    client: Client,
    base_url: String,
    index: String,
    doc_type: String,
}

impl HttpDocStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url(),
            index: config.index.clone(),
            doc_type: config.doc_type.clone(),
        })
    }

    fn doc_url(&self, id: &str) -> String {
        format!("{}/{}/{}/{}", self.base_url, self.index, self.doc_type, id)
    }
}

#[async_trait]
impl DocStore for HttpDocStore {
    async fn fetch(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let response = self.client.get(self.doc_url(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(id = %id, "No previous document");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let body: Value = response.json().await?;
        let doc = extract_source(&body);
        if doc.is_none() {
            debug!(id = %id, "Fetch response carries no document data");
        }
        Ok(doc)
    }

    async fn upsert(&self, id: &str, doc: &Document) -> Result<(), StoreError> {
        let response = self.client.put(self.doc_url(id)).json(doc).send().await?;
        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(status_error(response).await);
        }
        debug!(id = %id, status = %status, "Document stored");
        Ok(())
    }

    async fn insert(&self, doc: &Document) -> Result<(), StoreError> {
        let url = format!("{}/{}/{}/", self.base_url, self.index, self.doc_type);
        let response = self.client.post(url).json(doc).send().await?;
        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(status_error(response).await);
        }
        Ok(())
    }

    async fn terms(&self, field: &str, size: usize) -> Result<Vec<String>, StoreError> {
        let query = json!({
            "aggs": {
                field: {
                    "terms": { "field": field, "size": size }
                }
            }
        });
        let url = format!("{}/{}/_search?size=0", self.base_url, self.index);
        let response = self.client.post(url).json(&query).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let body: Value = response.json().await?;
        parse_term_buckets(&body, field).ok_or_else(|| {
            StoreError::InvalidResponse(format!("no {} aggregation in search response", field))
        })
    }

    async fn ensure_index(&self, create_missing: bool) -> Result<(), StoreError> {
        let url = format!("{}/_cat/indices?v", self.base_url);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let listing = response.text().await?;
        if index_listed(&listing, &self.index) {
            return Ok(());
        }
        if !create_missing {
            info!(index = %self.index, "Index missing, not creating it");
            return Ok(());
        }
        info!(index = %self.index, "Creating index");
        let response = self
            .client
            .put(format!("{}/{}", self.base_url, self.index))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(MAPPING_TEMPLATE)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }
}

async fn status_error(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let reason = response.text().await.unwrap_or_default();
    StoreError::Status { status, reason }
}

/// Pull `_source` out of a fetch response. A 2xx body without one means
/// the store never held the document.
pub fn extract_source(body: &Value) -> Option<Document> {
    body.get("_source").and_then(Document::from_json_object)
}

/// The `_cat/indices?v` listing is whitespace-formatted text with one
/// index per row; a substring check is enough.
pub fn index_listed(listing: &str, index: &str) -> bool {
    listing.contains(index)
}

/// Read bucket keys out of a terms-aggregation response.
pub fn parse_term_buckets(body: &Value, field: &str) -> Option<Vec<String>> {
    let buckets = body.get("aggregations")?.get(field)?.get("buckets")?.as_array()?;
    Some(
        buckets
            .iter()
            .filter_map(|b| b.get("key").and_then(Value::as_str).map(str::to_string))
            .collect(),
    )
}
