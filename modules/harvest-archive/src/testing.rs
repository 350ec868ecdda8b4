// Test mocks for the archive crate.
//
// - MockStrategy (FetchStrategy): fixed result, call counter, optional delay
// - MockSearchProvider (SearchProvider): fixed results or a fixed error
//
// Plus HTML fixtures for the three page shapes the orchestrator must handle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use harvest_common::{SearchResponse, SearchResult};

use crate::fetch::{FetchErrorCode, FetchResult, FetchStrategy};
use crate::search::SearchProvider;

// ---------------------------------------------------------------------------
// MockStrategy
// ---------------------------------------------------------------------------

/// Returns the same `FetchResult` on every call and counts calls.
pub struct MockStrategy {
    name: String,
    result: FetchResult,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockStrategy {
    pub fn new(name: &str, result: FetchResult) -> Self {
        Self {
            name: name.to_string(),
            result,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding(name: &str, html: impl Into<String>) -> Self {
        Self::new(name, FetchResult::html(html))
    }

    pub fn failing(name: &str, code: FetchErrorCode, message: &str) -> Self {
        Self::new(name, FetchResult::failure(code, message))
    }

    /// Sleep (on the tokio clock) before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchStrategy for MockStrategy {
    async fn fetch(&self, _url: &str) -> FetchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// MockSearchProvider
// ---------------------------------------------------------------------------

pub struct MockSearchProvider {
    name: String,
    results: Vec<SearchResult>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockSearchProvider {
    /// A provider that answers with no results until `with_results` is used.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            results: Vec::new(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    pub fn with_results(mut self, results: Vec<SearchResult>) -> Self {
        self.results = results;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("MockSearchProvider {}: scripted failure for {query}", self.name);
        }
        let results = self.results.iter().take(max_results).cloned().collect();
        Ok(SearchResponse::new(self.name.clone(), results))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// HTML fixtures
// ---------------------------------------------------------------------------

/// A server-rendered article wrapped in navigation, a cookie banner and a footer.
pub fn article_html() -> String {
    let paragraphs = [
        "The city council voted on Tuesday to fund a year-round warming center in the old library building on Fifth Street.",
        "Advocates had pushed for the change since last winter, when overnight shelters turned people away on the coldest nights.",
        "The center will open at six in the evening and close at eight in the morning, with meals provided by three local congregations.",
        "Staff from the county health department will offer flu shots and connect visitors with longer-term housing programs.",
        "Council members said they would revisit the budget in the spring once attendance numbers are available.",
    ];
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>\n")).collect();
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>Council funds warming center | City News</title>
  <meta property="og:title" content="Council funds year-round warming center">
</head>
<body>
  <header><a href="/">City News</a></header>
  <nav><a href="/news">News</a> <a href="/sports">Sports</a></nav>
  <div class="cookie-banner">We use cookies to improve your experience.</div>
  <article>
    <h1>Council funds year-round warming center</h1>
    {body}
  </article>
  <aside class="sidebar">Most read this week</aside>
  <footer>Copyright 2024 City News. All rights reserved.</footer>
</body>
</html>"#
    )
}

/// A single-page-app shell: empty root container and a bundle script.
pub fn spa_shell_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>Community App</title></head>
<body>
  <noscript>You need to enable JavaScript to run this app.</noscript>
  <div id="root"></div>
  <script src="/static/js/main.8f3a2c.js"></script>
</body>
</html>"#
        .to_string()
}

/// A page whose article body only exists inside streamed script payloads,
/// interleaved with asset paths and an escaped character.
pub fn streaming_payload_html() -> String {
    let sentences = [
        "The riverside community garden opened its gates to over two hundred neighbors this weekend.",
        "Volunteers built twelve raised beds, a tool library, and a small greenhouse for seedlings.",
        "Organizers said the fish \\x26 chips fundraiser covered the cost of soil and lumber this season.",
        "Plots are still available for families who sign up at the public library before the end of May.",
    ];
    let mut scripts = String::from("<script>self.__next_f.push([0])</script>\n");
    scripts.push_str(
        r#"<script>self.__next_f.push([1,"1:I[\"/_next/static/chunks/app/page-9f8e7d6c5b4a3f2e.js\",[\"static/chunks/main-app.js\"],\"\"]\n"])</script>"#,
    );
    scripts.push('\n');
    for (i, s) in sentences.iter().enumerate() {
        scripts.push_str(&format!(
            r#"<script>self.__next_f.push([1,"{n}:[\"$\",\"p\",null,{{\"children\":\"{s}\"}}]\n"])</script>"#,
            n = i + 2
        ));
        scripts.push('\n');
    }
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Garden opens to neighbors</title></head>
<body>
  <div id="__next"><p>Loading</p></div>
  {scripts}
</body>
</html>"#
    )
}
