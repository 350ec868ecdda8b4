use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use harvest_common::{SearchResponse, SearchResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::SearchProvider;

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

/// Tavily web search provider.
pub struct TavilyProvider {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
}

#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
}

impl TavilyProvider {
    pub fn new(api_key: &str) -> crate::error::Result<Self> {
        Self::with_endpoint(api_key, TAVILY_ENDPOINT)
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

#[async_trait]
impl SearchProvider for TavilyProvider {
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResponse> {
        info!(query, max_results, "Tavily search");

        let request = TavilySearchRequest {
            api_key: &self.api_key,
            query,
            max_results,
            search_depth: "basic",
        };

        let resp: TavilySearchResponse = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .context("Tavily API request failed")?
            .error_for_status()
            .context("Tavily API returned an error status")?
            .json()
            .await
            .context("Failed to parse Tavily response")?;

        let results: Vec<SearchResult> = resp
            .results
            .into_iter()
            .take(max_results)
            .map(|r| SearchResult {
                url: r.url,
                title: r.title,
                snippet: r.content,
                relevance_score: r.score.clamp(0.0, 1.0),
            })
            .collect();

        info!(query, count = results.len(), "Tavily search complete");
        Ok(SearchResponse::new(self.name(), results))
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uses_provider_scores() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({"query": "river cleanup", "max_results": 3}),
            ))
            .with_status(200)
            .with_body(
                r#"{"results": [
                    {"url": "https://b.test", "title": "B", "content": "bee", "score": 0.91},
                    {"url": "https://c.test", "title": "C", "content": "sea", "score": 0.42}
                ]}"#,
            )
            .create_async()
            .await;

        let provider =
            TavilyProvider::with_endpoint("key", &format!("{}/search", server.url())).unwrap();
        let resp = provider.search("river cleanup", 3).await.unwrap();

        assert_eq!(resp.provider, "tavily");
        assert_eq!(resp.results[0].relevance_score, 0.91);
        assert_eq!(resp.results[1].snippet, "sea");
        assert!(resp.enrichment.is_none());
    }
}
