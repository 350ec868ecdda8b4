// Test mocks for the research executor.
//
// - MockSearcher (WebSearcher): query -> response, or a scripted failure
// - MockScraper (PageScraper): url -> ScrapeResult, FETCH_FAILED otherwise
//
// Plus helpers for building search hits and long-enough page content.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use harvest_archive::extract::SUMMARY_CHARS;
use harvest_common::{
    ScrapeErrorCode, ScrapeResult, SearchEnrichment, SearchResponse, SearchResult,
};

use crate::traits::{PageScraper, WebSearcher};

// ---------------------------------------------------------------------------
// MockSearcher
// ---------------------------------------------------------------------------

pub struct MockSearcher {
    responses: HashMap<String, SearchResponse>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            failing: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on_query(mut self, query: &str, results: Vec<SearchResult>) -> Self {
        self.responses
            .insert(query.to_string(), SearchResponse::new("mock", results));
        self
    }

    pub fn on_query_with_enrichment(
        mut self,
        query: &str,
        results: Vec<SearchResult>,
        enrichment: SearchEnrichment,
    ) -> Self {
        self.responses.insert(
            query.to_string(),
            SearchResponse::new("mock", results).with_enrichment(enrichment),
        );
        self
    }

    pub fn on_response(mut self, query: &str, response: SearchResponse) -> Self {
        self.responses.insert(query.to_string(), response);
        self
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSearcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebSearcher for MockSearcher {
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(query) {
            bail!("MockSearcher: scripted failure for {query}");
        }
        let mut resp = self
            .responses
            .get(query)
            .cloned()
            .unwrap_or_else(|| SearchResponse::new("mock", Vec::new()));
        resp.results.truncate(max_results);
        Ok(resp)
    }
}

// ---------------------------------------------------------------------------
// MockScraper
// ---------------------------------------------------------------------------

pub struct MockScraper {
    pages: HashMap<String, ScrapeResult>,
    scraped: Mutex<Vec<String>>,
}

impl MockScraper {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            scraped: Mutex::new(Vec::new()),
        }
    }

    pub fn on_page(mut self, url: &str, result: ScrapeResult) -> Self {
        self.pages.insert(url.to_string(), result);
        self
    }

    /// URLs scraped so far, in call order.
    pub fn scraped_urls(&self) -> Vec<String> {
        self.scraped.lock().expect("mock scraper lock poisoned").clone()
    }
}

impl Default for MockScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageScraper for MockScraper {
    async fn scrape(&self, url: &str) -> ScrapeResult {
        self.scraped
            .lock()
            .expect("mock scraper lock poisoned")
            .push(url.to_string());
        self.pages.get(url).cloned().unwrap_or_else(|| {
            ScrapeResult::failure(url, ScrapeErrorCode::FetchFailed, "no page registered")
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn hit(url: &str, score: f64) -> SearchResult {
    SearchResult {
        title: format!("Result for {url}"),
        url: url.to_string(),
        snippet: format!("Snippet for {url}"),
        relevance_score: score,
    }
}

/// A successful scrape with `chars` characters of prose.
pub fn page(title: &str, chars: usize) -> ScrapeResult {
    let content: String = "Neighbors organized a tool library in the church basement. "
        .repeat(chars / 50 + 1)
        .chars()
        .take(chars)
        .collect();
    let summary: String = content.chars().take(SUMMARY_CHARS).collect();
    ScrapeResult::success(title, content, summary, false)
}
