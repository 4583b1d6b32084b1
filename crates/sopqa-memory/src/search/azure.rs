use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::SearchError;
use super::schema::{IndexSchema, VECTOR_FIELD};
use super::store::{BoxFuture, HybridQuery, IndexRecord, SearchHit, SearchStore};

pub const DEFAULT_API_VERSION: &str = "2024-07-01";

/// Azure AI Search REST client bound to one index.
#[derive(Clone)]
pub struct AzureSearchStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    index_name: String,
    api_version: String,
}

impl fmt::Debug for AzureSearchStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureSearchStore")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("index_name", &self.index_name)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl AzureSearchStore {
    #[must_use]
    pub fn new(
        mut endpoint: String,
        api_key: String,
        index_name: String,
        api_version: String,
    ) -> Self {
        while endpoint.ends_with('/') {
            endpoint.pop();
        }
        Self {
            client: sopqa_llm::http::default_client(),
            endpoint,
            api_key,
            index_name,
            api_version,
        }
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/indexes/{}{suffix}?api-version={}",
            self.endpoint, self.index_name, self.api_version
        )
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> Result<(reqwest::StatusCode, String), SearchError> {
        // body-carrying requests get their content type from `.json()`
        let response = request.header("api-key", &self.api_key).send().await?;

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(index = %self.index_name, %status, "search {operation}");

        if status.is_success() {
            return Ok((status, text));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(index = %self.index_name, "Azure AI Search rate limited");
        } else {
            tracing::error!("Azure AI Search {operation} error {status}: {text}");
        }
        Err(SearchError::from_status(status, &self.index_name, text))
    }

    async fn put_index(&self, schema: &IndexSchema) -> Result<(), SearchError> {
        let request = self.client.put(self.url("")).json(schema);
        self.send(request, "create index").await?;
        Ok(())
    }

    async fn remove_index(&self) -> Result<(), SearchError> {
        self.send(self.client.delete(self.url("")), "delete index")
            .await?;
        Ok(())
    }

    async fn index_batch(&self, records: Vec<IndexRecord>) -> Result<(), SearchError> {
        if records.is_empty() {
            return Ok(());
        }
        let body = IndexBatch {
            value: records
                .into_iter()
                .map(|record| IndexAction {
                    action: "upload",
                    record,
                })
                .collect(),
        };
        let request = self.client.post(self.url("/docs/index")).json(&body);
        let (status, text) = self.send(request, "upload").await?;

        // per-record results; 207 when some of them were rejected
        if status == reqwest::StatusCode::MULTI_STATUS || !text.trim().is_empty() {
            let resp: IndexBatchResponse = serde_json::from_str(&text)?;
            let failed: Vec<String> = resp
                .value
                .into_iter()
                .filter(|r| !r.status)
                .map(|r| {
                    tracing::error!(
                        key = %r.key,
                        status = r.status_code,
                        "record rejected: {}",
                        r.error_message.as_deref().unwrap_or("unknown error")
                    );
                    r.key
                })
                .collect();
            if !failed.is_empty() {
                return Err(SearchError::Upload { failed });
            }
        }
        Ok(())
    }

    async fn search(&self, query: HybridQuery) -> Result<Vec<SearchHit>, SearchError> {
        let body = SearchRequest {
            search: &query.text,
            vector_queries: [VectorQuery {
                kind: "vector",
                vector: &query.vector,
                k: query.top_k,
                fields: VECTOR_FIELD,
            }],
            select: query.select.join(","),
            top: query.top_k,
        };
        let request = self.client.post(self.url("/docs/search")).json(&body);
        let (_, text) = self.send(request, "search").await?;
        let resp: SearchResponse = serde_json::from_str(&text)?;

        Ok(resp
            .value
            .into_iter()
            .map(|mut fields| {
                let score = fields
                    .remove("@search.score")
                    .and_then(|v| v.as_f64())
                    .unwrap_or(0.0);
                fields.retain(|k, _| !k.starts_with("@search."));
                SearchHit { score, fields }
            })
            .collect())
    }

    async fn count(&self) -> Result<u64, SearchError> {
        let (_, text) = self
            .send(self.client.get(self.url("/docs/$count")), "count")
            .await?;
        text.trim_start_matches('\u{feff}')
            .trim()
            .parse()
            .map_err(|_| SearchError::Other(format!("unexpected document count: {text}")))
    }
}

impl SearchStore for AzureSearchStore {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    fn create_index(&self, schema: &IndexSchema) -> BoxFuture<'_, Result<(), SearchError>> {
        let schema = schema.clone();
        Box::pin(async move { self.put_index(&schema).await })
    }

    fn delete_index(&self) -> BoxFuture<'_, Result<(), SearchError>> {
        Box::pin(self.remove_index())
    }

    fn upload(&self, records: Vec<IndexRecord>) -> BoxFuture<'_, Result<(), SearchError>> {
        Box::pin(self.index_batch(records))
    }

    fn hybrid_search(
        &self,
        query: HybridQuery,
    ) -> BoxFuture<'_, Result<Vec<SearchHit>, SearchError>> {
        Box::pin(self.search(query))
    }

    fn document_count(&self) -> BoxFuture<'_, Result<u64, SearchError>> {
        Box::pin(self.count())
    }
}

#[derive(Serialize)]
struct IndexBatch {
    value: Vec<IndexAction>,
}

#[derive(Serialize)]
struct IndexAction {
    #[serde(rename = "@search.action")]
    action: &'static str,
    #[serde(flatten)]
    record: IndexRecord,
}

#[derive(Deserialize)]
struct IndexBatchResponse {
    #[serde(default)]
    value: Vec<IndexingResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexingResult {
    key: String,
    status: bool,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    status_code: u16,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    search: &'a str,
    vector_queries: [VectorQuery<'a>; 1],
    select: String,
    top: usize,
}

#[derive(Serialize)]
struct VectorQuery<'a> {
    kind: &'static str,
    vector: &'a [f32],
    k: usize,
    fields: &'static str,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<serde_json::Map<String, serde_json::Value>>,
}
