//! Managed index adapter / 托管索引适配器
//!
//! Builds `$search` aggregation pipelines for the external full-text index
//! and maps the returned documents back to figure records.
//!
//! Failure policy:
//! - autocomplete / partial: any index error is logged and the same call is
//!   re-run once on the local matcher
//! - search: index errors propagate to the caller
//!
//! Relevance order comes from the index and is not identical to the local
//! matcher's name order.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::backend::SearchBackend;
use super::error::{Result, SearchError};
use super::local::LocalMatcher;
use super::mode::SearchMode;
use super::projector::{project_document, INDEX_PROJECTION_FIELDS};
use super::query::{NormalizedQuery, UserId, Window};
use crate::config::ManagedIndexConfig;
use crate::models::Figure;

const USER_PATH: &str = "userId";
const SEARCH_PATHS: &[&str] = &["manufacturer", "name", "location", "boxNumber"];

/// Remote aggregation capability / 远程聚合查询能力
#[async_trait]
pub trait IndexClient: Send + Sync {
    async fn aggregate(&self, pipeline: Vec<Value>) -> Result<Vec<Value>>;
}

/// Data API client over HTTP / 基于 HTTP 的数据 API 客户端
pub struct HttpIndexClient {
    client: Client,
    aggregate_url: Url,
    api_key: String,
    data_source: String,
    database: String,
    collection: String,
}

#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    documents: Vec<Value>,
}

impl HttpIndexClient {
    pub fn new(config: &ManagedIndexConfig) -> Result<Self> {
        let base = Url::parse(config.endpoint.trim_end_matches('/'))
            .map_err(|e| SearchError::Index(format!("invalid index endpoint {:?}: {}", config.endpoint, e)))?;
        let aggregate_url = Url::parse(&format!("{}/action/aggregate", base.as_str().trim_end_matches('/')))
            .map_err(|e| SearchError::Index(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| SearchError::Index(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            aggregate_url,
            api_key: config.api_key.clone(),
            data_source: config.data_source.clone(),
            database: config.database.clone(),
            collection: config.collection.clone(),
        })
    }
}

#[async_trait]
impl IndexClient for HttpIndexClient {
    async fn aggregate(&self, pipeline: Vec<Value>) -> Result<Vec<Value>> {
        let body = json!({
            "dataSource": self.data_source,
            "database": self.database,
            "collection": self.collection,
            "pipeline": pipeline,
        });

        let resp = self.client
            .post(self.aggregate_url.clone())
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(SearchError::Index(format!("aggregate failed: status={}, body={}", status, text)));
        }

        let parsed: AggregateResponse = resp.json().await?;
        Ok(parsed.documents)
    }
}

fn user_filter(user: &UserId) -> Value {
    json!({ "equals": { "path": USER_PATH, "value": user.to_string() } })
}

fn project_stage() -> Value {
    let fields: Map<String, Value> = INDEX_PROJECTION_FIELDS
        .iter()
        .map(|f| (f.to_string(), json!(1)))
        .collect();
    json!({ "$project": fields })
}

/// Autocomplete on `name`, one edit of fuzziness / 名称联想，允许1次编辑
pub fn autocomplete_pipeline(index: &str, query: &str, user: &UserId, limit: usize) -> Vec<Value> {
    vec![
        json!({
            "$search": {
                "index": index,
                "compound": {
                    "must": [{
                        "autocomplete": {
                            "query": query,
                            "path": "name",
                            "fuzzy": { "maxEdits": 1 }
                        }
                    }],
                    "filter": [user_filter(user)]
                }
            }
        }),
        json!({ "$limit": limit }),
        project_stage(),
    ]
}

/// Relevance-scored OR over `name` and `manufacturer` / 名称或厂商的相关性查询
pub fn partial_pipeline(index: &str, query: &str, user: &UserId, window: Window) -> Vec<Value> {
    vec![
        json!({
            "$search": {
                "index": index,
                "compound": {
                    "should": [
                        { "text": { "query": query, "path": "name" } },
                        { "text": { "query": query, "path": "manufacturer" } }
                    ],
                    "minimumShouldMatch": 1,
                    "filter": [user_filter(user)]
                }
            }
        }),
        json!({ "$skip": window.offset }),
        json!({ "$limit": window.limit }),
        project_stage(),
    ]
}

/// One fuzzy `must` clause per term across all searchable fields / 每个词项一个 must 子句
pub fn search_pipeline(index: &str, query: &str, user: &UserId) -> Vec<Value> {
    let must: Vec<Value> = query
        .split_whitespace()
        .map(|term| {
            json!({
                "text": {
                    "query": term,
                    "path": SEARCH_PATHS,
                    "fuzzy": { "maxEdits": 1, "prefixLength": 2 }
                }
            })
        })
        .collect();

    vec![
        json!({
            "$search": {
                "index": index,
                "compound": {
                    "must": must,
                    "filter": [user_filter(user)]
                }
            }
        }),
        project_stage(),
    ]
}

pub struct ManagedIndex {
    client: Arc<dyn IndexClient>,
    index_name: String,
    fallback: LocalMatcher,
}

impl ManagedIndex {
    pub fn new(client: Arc<dyn IndexClient>, index_name: impl Into<String>, fallback: LocalMatcher) -> Self {
        Self {
            client,
            index_name: index_name.into(),
            fallback,
        }
    }

    async fn run(&self, pipeline: Vec<Value>) -> Result<Vec<Figure>> {
        let docs = self.client.aggregate(pipeline).await?;
        docs.iter().map(project_document).collect()
    }
}

#[async_trait]
impl SearchBackend for ManagedIndex {
    async fn autocomplete(&self, query: &NormalizedQuery, user: &UserId, window: Window) -> Result<Vec<Figure>> {
        let pipeline = autocomplete_pipeline(&self.index_name, query.text(), user, window.limit);
        match self.run(pipeline).await {
            Ok(hits) => Ok(hits),
            Err(e) => {
                tracing::warn!("Managed autocomplete failed, using local matcher: {}", e);
                self.fallback.autocomplete(query, user, window).await
            }
        }
    }

    async fn partial(&self, query: &NormalizedQuery, user: &UserId, window: Window) -> Result<Vec<Figure>> {
        let pipeline = partial_pipeline(&self.index_name, query.text(), user, window);
        match self.run(pipeline).await {
            Ok(hits) => Ok(hits),
            Err(e) => {
                tracing::warn!("Managed partial search failed, using local matcher: {}", e);
                self.fallback.partial(query, user, window).await
            }
        }
    }

    async fn search(&self, query: &NormalizedQuery, user: &UserId) -> Result<Vec<Figure>> {
        let pipeline = search_pipeline(&self.index_name, query.text(), user);
        self.run(pipeline).await
    }

    fn mode(&self) -> SearchMode {
        SearchMode::Managed
    }
}
