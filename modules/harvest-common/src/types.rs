use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Error codes ---

/// Why a scrape produced a placeholder instead of real content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScrapeErrorCode {
    /// Origin answered 4xx.
    ClientError,
    /// Origin answered 5xx.
    ServerError,
    Timeout,
    /// Response was not an HTML document.
    NotHtml,
    /// Transport fault or empty body.
    FetchFailed,
    ContentTooShort,
    QualityCheckFailed,
    InvalidUrl,
}

impl ScrapeErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeErrorCode::ClientError => "CLIENT_ERROR",
            ScrapeErrorCode::ServerError => "SERVER_ERROR",
            ScrapeErrorCode::Timeout => "TIMEOUT",
            ScrapeErrorCode::NotHtml => "NOT_HTML",
            ScrapeErrorCode::FetchFailed => "FETCH_FAILED",
            ScrapeErrorCode::ContentTooShort => "CONTENT_TOO_SHORT",
            ScrapeErrorCode::QualityCheckFailed => "QUALITY_CHECK_FAILED",
            ScrapeErrorCode::InvalidUrl => "INVALID_URL",
        }
    }
}

impl fmt::Display for ScrapeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Scrape results ---

/// Final outcome of scraping one URL. Always well-formed: a failure carries
/// `error`/`error_code` and placeholder title/content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_js_rendering: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ScrapeErrorCode>,
}

impl ScrapeResult {
    pub fn success(
        title: impl Into<String>,
        content: impl Into<String>,
        summary: impl Into<String>,
        needs_js_rendering: bool,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            summary: Some(summary.into()),
            needs_js_rendering: Some(needs_js_rendering),
            error: None,
            error_code: None,
        }
    }

    /// Placeholder result for a URL that could not be scraped.
    pub fn failure(url: &str, code: ScrapeErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            title: format!("Failed to scrape {url}"),
            content: format!("Unable to retrieve content from {url}: {message}"),
            summary: None,
            needs_js_rendering: None,
            error: Some(message),
            error_code: Some(code),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    /// Length of `content` in characters.
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }
}

// --- Search ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub relevance_score: f64,
}

/// Extra structured data some providers attach to a result page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEnrichment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_graph: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_box: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_questions: Vec<serde_json::Value>,
}

impl SearchEnrichment {
    pub fn is_empty(&self) -> bool {
        self.knowledge_graph.is_none()
            && self.answer_box.is_none()
            && self.related_questions.is_empty()
    }
}

/// One provider's answer to one query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub provider: String,
    pub results: Vec<SearchResult>,
    pub enrichment: Option<SearchEnrichment>,
}

impl SearchResponse {
    pub fn new(provider: impl Into<String>, results: Vec<SearchResult>) -> Self {
        Self {
            provider: provider.into(),
            results,
            enrichment: None,
        }
    }

    pub fn with_enrichment(mut self, enrichment: SearchEnrichment) -> Self {
        if !enrichment.is_empty() {
            self.enrichment = Some(enrichment);
        }
        self
    }
}

// --- Research pass ---

/// A URL picked for scraping, with the score of the search hit it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeCandidate {
    pub url: String,
    pub relevance_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedContent {
    pub url: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub content_length: usize,
    pub scraped_at: DateTime<Utc>,
    pub context_id: Uuid,
    pub relevance_score: f64,
}

/// Aggregate of one research pass: every search hit, every accepted scrape,
/// and the URLs that could not be scraped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestedData {
    pub search_results: Vec<SearchResult>,
    pub scraped_content: Vec<ScrapedContent>,
    pub failed_scrape_urls: BTreeSet<String>,
    pub failed_scrape_errors: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<SearchEnrichment>,
}

impl HarvestedData {
    pub fn record_failure(&mut self, url: &str, message: impl Into<String>) {
        self.failed_scrape_urls.insert(url.to_string());
        self.failed_scrape_errors
            .insert(url.to_string(), message.into());
    }

    pub fn total_content_chars(&self) -> usize {
        self.scraped_content.iter().map(|c| c.content_length).sum()
    }
}

/// True for absolute `http`/`https` URLs with a host.
pub fn is_http_url(raw: &str) -> bool {
    url::Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_result_carries_placeholder_and_code() {
        let r = ScrapeResult::failure(
            "https://example.com",
            ScrapeErrorCode::Timeout,
            "direct: timed out",
        );
        assert!(r.is_failure());
        assert_eq!(r.error_code, Some(ScrapeErrorCode::Timeout));
        assert_eq!(r.title, "Failed to scrape https://example.com");
        assert!(r.content.contains("direct: timed out"));
        assert!(r.summary.is_none());
    }

    #[test]
    fn success_result_has_no_error() {
        let r = ScrapeResult::success("Title", "Body text", "Body", false);
        assert!(!r.is_failure());
        assert_eq!(r.content_length(), 9);
        assert_eq!(r.needs_js_rendering, Some(false));
    }

    #[test]
    fn error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ScrapeErrorCode::QualityCheckFailed).unwrap();
        assert_eq!(json, "\"QUALITY_CHECK_FAILED\"");
        assert_eq!(ScrapeErrorCode::NotHtml.to_string(), "NOT_HTML");
    }

    #[test]
    fn scrape_result_serializes_camel_case_and_skips_none() {
        let r = ScrapeResult::failure("https://x.test", ScrapeErrorCode::NotHtml, "pdf");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["errorCode"], "NOT_HTML");
        assert!(v.get("summary").is_none());
        assert!(v.get("needsJsRendering").is_none());
    }

    #[test]
    fn http_url_check() {
        assert!(is_http_url("https://example.com/a?b=c"));
        assert!(is_http_url("http://example.com"));
        assert!(!is_http_url("ftp://example.com/file"));
        assert!(!is_http_url("javascript:alert(1)"));
        assert!(!is_http_url("not a url"));
    }

    #[test]
    fn record_failure_tracks_url_and_message() {
        let mut data = HarvestedData::default();
        data.record_failure("https://a.test", "TIMEOUT");
        data.record_failure("https://a.test", "TIMEOUT again");
        assert_eq!(data.failed_scrape_urls.len(), 1);
        assert_eq!(data.failed_scrape_errors["https://a.test"], "TIMEOUT again");
    }

    #[test]
    fn empty_enrichment_is_dropped() {
        let resp = SearchResponse::new("serper", vec![]).with_enrichment(SearchEnrichment::default());
        assert!(resp.enrichment.is_none());
    }
}
