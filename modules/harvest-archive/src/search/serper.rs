// Serper (Google Search) provider.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use harvest_common::{SearchEnrichment, SearchResponse, SearchResult};
use tracing::info;

use super::SearchProvider;

const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
    #[serde(default)]
    knowledge_graph: Option<serde_json::Value>,
    #[serde(default)]
    answer_box: Option<serde_json::Value>,
    #[serde(default)]
    people_also_ask: Vec<serde_json::Value>,
}

#[derive(Debug, serde::Deserialize)]
struct SerperResult {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

pub struct SerperProvider {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl SerperProvider {
    pub fn new(api_key: &str) -> crate::error::Result<Self> {
        Self::with_endpoint(api_key, SERPER_ENDPOINT)
    }

    pub fn with_endpoint(api_key: &str, endpoint: &str) -> crate::error::Result<Self> {
        Ok(Self {
            api_key: api_key.to_string(),
            endpoint: endpoint.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()?,
        })
    }
}

/// Rank-derived relevance: 1.0 for the top hit, falling linearly with position.
fn position_score(index: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    1.0 - index as f64 / total as f64
}

#[async_trait]
impl SearchProvider for SerperProvider {
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResponse> {
        info!(query, max_results, "Serper search");

        let body = serde_json::json!({
            "q": query,
            "num": max_results,
        });

        let data: SerperResponse = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Serper API request failed")?
            .error_for_status()
            .context("Serper API returned an error status")?
            .json()
            .await
            .context("Failed to parse Serper response")?;

        let organic: Vec<SerperResult> = data
            .organic
            .into_iter()
            .filter(|r| !r.link.is_empty())
            .take(max_results)
            .collect();
        let total = organic.len();
        let results: Vec<SearchResult> = organic
            .into_iter()
            .enumerate()
            .map(|(i, r)| SearchResult {
                url: r.link,
                title: r.title,
                snippet: r.snippet,
                relevance_score: position_score(i, total),
            })
            .collect();

        info!(query, count = results.len(), "Serper search complete");

        let enrichment = SearchEnrichment {
            knowledge_graph: data.knowledge_graph,
            answer_box: data.answer_box,
            related_questions: data.people_also_ask,
        };
        Ok(SearchResponse::new(self.name(), results).with_enrichment(enrichment))
    }

    fn name(&self) -> &str {
        "serper"
    }
}
