use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::AppConfig;

/// REST api-version for the search service. Independent of the OpenAI
/// api-version carried in the configuration.
const SEARCH_API_VERSION: &str = "2023-11-01";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("search service returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

/// One ranked document out of the index. Fields absent on the document come
/// back as empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedPassage {
    pub content: String,
    pub source: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    content: String,
    #[serde(default)]
    source: String,
}

impl From<SearchHit> for RetrievedPassage {
    fn from(hit: SearchHit) -> Self {
        Self {
            content: hit.content,
            source: hit.source,
        }
    }
}

/// Seam the orchestrator retrieves through; lets tests stand in for the
/// hosted index.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn search(&self, vector: &[f32], top_k: usize) -> anyhow::Result<Vec<RetrievedPassage>>;
}

/// Client for the hosted vector search index (Azure AI Search REST API).
#[derive(Clone)]
pub struct SearchIndexClient {
    client: reqwest::Client,
    search_url: String,
    api_key: String,
}

impl SearchIndexClient {
    pub fn new(config: &AppConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let search_url = format!(
            "{}/indexes/{}/docs/search?api-version={SEARCH_API_VERSION}",
            config.search_endpoint.trim_end_matches('/'),
            config.search_index
        );

        Ok(Self {
            client,
            search_url,
            api_key: config.search_key.clone(),
        })
    }

    /// Vector search against the index's `embedding` field, selecting only
    /// the `content` and `source` fields. Results come back in ranked order.
    pub async fn search_vectors(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, SearchError> {
        let body = json!({
            "select": "content,source",
            "top": top_k,
            "vectorQueries": [{
                "kind": "vector",
                "vector": vector,
                "fields": "embedding",
                "k": top_k
            }]
        });

        let response = self.post(&body).await?;
        let results: SearchResponse = response.json().await?;

        debug!("vector search returned {} documents", results.value.len());

        Ok(results.value.into_iter().map(Into::into).collect())
    }

    /// Cheapest possible round-trip, used by the connection probe.
    pub async fn ping(&self) -> Result<(), SearchError> {
        self.post(&json!({ "search": "*", "top": 1 })).await?;
        Ok(())
    }

    async fn post(&self, body: &serde_json::Value) -> Result<reqwest::Response, SearchError> {
        let response = self
            .client
            .post(&self.search_url)
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Api { status, body });
        }

        Ok(response)
    }
}

#[async_trait]
impl VectorSearch for SearchIndexClient {
    async fn search(&self, vector: &[f32], top_k: usize) -> anyhow::Result<Vec<RetrievedPassage>> {
        Ok(self.search_vectors(vector, top_k).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ranked_results() {
        let raw = r#"{
            "value": [
                {"@search.score": 2.17, "content": "Max pressure: 1480 psi", "source": "hydrotest_line_a.pdf"},
                {"@search.score": 1.93, "content": "Hold time: 8h", "source": "hydrotest_line_a.pdf"}
            ]
        }"#;

        let response: SearchResponse = serde_json::from_str(raw).unwrap();
        let passages: Vec<RetrievedPassage> =
            response.value.into_iter().map(Into::into).collect();

        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].content, "Max pressure: 1480 psi");
        assert_eq!(passages[1].source, "hydrotest_line_a.pdf");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let raw = r#"{"value": [{"@search.score": 0.4, "source": "orphan.pdf"}]}"#;

        let response: SearchResponse = serde_json::from_str(raw).unwrap();
        let passage = RetrievedPassage::from(response.value.into_iter().next().unwrap());

        assert_eq!(passage.content, "");
        assert_eq!(passage.source, "orphan.pdf");
    }

    #[test]
    fn empty_response_yields_no_passages() {
        let response: SearchResponse = serde_json::from_str(r#"{"value": []}"#).unwrap();
        assert!(response.value.is_empty());
    }
}
