// Search providers and the ordered fallback chain over them.

mod serper;
mod tavily;

pub use serper::SerperProvider;
pub use tavily::TavilyProvider;

use std::sync::Arc;

use async_trait::async_trait;
use harvest_common::{Config, SearchResponse, SearchResult};
use tracing::{info, warn};

/// Provider name carried by the synthetic degraded response.
pub const FALLBACK_PROVIDER: &str = "fallback";

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<SearchResponse>;

    fn name(&self) -> &str;
}

/// Tries providers in order; the first non-empty answer wins.
pub struct SearchChain {
    providers: Vec<Arc<dyn SearchProvider>>,
}

impl SearchChain {
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        Self { providers }
    }

    /// Serper first, then Tavily, for whichever keys are configured.
    pub fn from_config(config: &Config) -> crate::error::Result<Self> {
        let mut providers: Vec<Arc<dyn SearchProvider>> = Vec::new();
        if let Some(key) = &config.serper_api_key {
            providers.push(Arc::new(SerperProvider::new(key)?));
        }
        if let Some(key) = &config.tavily_api_key {
            providers.push(Arc::new(TavilyProvider::new(key)?));
        }
        if providers.is_empty() {
            warn!("No search provider configured, searches will return the degraded result");
        }
        Ok(Self::new(providers))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Never empty: when every provider fails or finds nothing, a single
    /// synthetic result pointing at a public search page is returned.
    pub async fn search(&self, query: &str, max_results: usize) -> SearchResponse {
        for provider in &self.providers {
            match provider.search(query, max_results).await {
                Ok(resp) if !resp.results.is_empty() => return resp,
                Ok(_) => {
                    info!(query, provider = provider.name(), "Provider returned no results");
                }
                Err(e) => {
                    warn!(query, provider = provider.name(), error = %e, "Provider failed");
                }
            }
        }
        warn!(query, "All search providers exhausted, returning degraded result");
        degraded_response(query)
    }
}

pub fn degraded_response(query: &str) -> SearchResponse {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    SearchResponse::new(
        FALLBACK_PROVIDER,
        vec![SearchResult {
            title: "No search results available".to_string(),
            url: format!("https://duckduckgo.com/?q={encoded}"),
            snippet: format!("Search providers returned nothing for \"{query}\"."),
            relevance_score: 0.0,
        }],
    )
}
