// Trait seams for the research executor.
//
// PageScraper stands in for the archive Scraper, WebSearcher for the
// SearchChain. Mocks in `testing` let the executor run with no network.

use anyhow::Result;
use async_trait::async_trait;
use harvest_archive::{SearchChain, Scraper};
use harvest_common::{ScrapeResult, SearchResponse};

// ---------------------------------------------------------------------------
// PageScraper
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PageScraper: Send + Sync {
    /// Scrape one URL. Failures come back as a result with `error` set.
    async fn scrape(&self, url: &str) -> ScrapeResult;
}

#[async_trait]
impl PageScraper for Scraper {
    async fn scrape(&self, url: &str) -> ScrapeResult {
        Scraper::scrape(self, url).await
    }
}

// ---------------------------------------------------------------------------
// WebSearcher
// ---------------------------------------------------------------------------

#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResponse>;
}

#[async_trait]
impl WebSearcher for SearchChain {
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResponse> {
        Ok(SearchChain::search(self, query, max_results).await)
    }
}
