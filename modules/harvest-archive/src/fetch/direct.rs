// Direct fetch: plain GET with browser-like headers. The fast path.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::{debug, info};

use super::{is_html_content_type, FetchErrorCode, FetchResult, FetchStrategy};
use crate::error::Result;

pub const DIRECT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_REDIRECTS: usize = 10;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub struct DirectFetch {
    client: reqwest::Client,
}

impl DirectFetch {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DIRECT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(browser_headers())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers
}

fn transport_failure(err: &reqwest::Error) -> FetchResult {
    if err.is_timeout() {
        FetchResult::failure(FetchErrorCode::Timeout, "request timed out")
    } else {
        FetchResult::failure(FetchErrorCode::FetchFailed, err.to_string())
    }
}

#[async_trait]
impl FetchStrategy for DirectFetch {
    async fn fetch(&self, url: &str) -> FetchResult {
        debug!(url, strategy = "direct", "Fetching page");

        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => return transport_failure(&e),
        };

        let status = resp.status();
        if status.is_client_error() {
            return FetchResult::failure(
                FetchErrorCode::ClientError,
                format!("HTTP {}", status.as_u16()),
            );
        }
        if status.is_server_error() {
            return FetchResult::failure(
                FetchErrorCode::ServerError,
                format!("HTTP {}", status.as_u16()),
            );
        }

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_html_content_type(&content_type) {
            return FetchResult::failure(
                FetchErrorCode::NotHtml,
                format!("unsupported content type {content_type:?}"),
            );
        }

        let html = match resp.text().await {
            Ok(html) => html,
            Err(e) => return transport_failure(&e),
        };
        if html.trim().is_empty() {
            return FetchResult::failure(FetchErrorCode::FetchFailed, "empty response body");
        }

        info!(url, strategy = "direct", bytes = html.len(), "Fetched successfully");
        FetchResult::Success { html, content_type }
    }

    fn name(&self) -> &str {
        "direct"
    }
}
