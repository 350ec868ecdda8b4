// Headless render via a remote Browserless service. The slow path.

use std::time::Duration;

use async_trait::async_trait;
use browserless_client::{BrowserlessClient, BrowserlessError, RenderOptions, RenderedPage};
use rand::Rng;
use tracing::{info, warn};

use super::{FetchErrorCode, FetchResult, FetchStrategy};
use crate::error::Result;

/// Total `/content` attempts, including the first.
pub const HEADLESS_MAX_ATTEMPTS: u32 = 2;
/// Backoff before retry n (0-based) is base * 2^n plus jitter.
pub const HEADLESS_RETRY_BASE: Duration = Duration::from_millis(250);
const HEADLESS_RETRY_JITTER_MS: u64 = 100;
/// Client timeout for one `/content` or `/unblock` call. Direct fetch, every
/// attempt and the backoff between them fit inside the outer scrape timeout.
pub const HEADLESS_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(11);

/// Navigation, selector wait and settle delay stay under one attempt's timeout.
fn render_options() -> RenderOptions {
    RenderOptions {
        navigation_timeout_ms: 8_000,
        selector_timeout_ms: 2_000,
        ..RenderOptions::default()
    }
}

pub struct HeadlessRender {
    client: BrowserlessClient,
}

impl HeadlessRender {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        info!(base_url, "HeadlessRender initialized");
        let client = BrowserlessClient::with_timeout(base_url, token, HEADLESS_ATTEMPT_TIMEOUT)?
            .with_options(render_options());
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: BrowserlessClient) -> Self {
        Self { client }
    }

    async fn render_with_retry(&self, url: &str) -> browserless_client::Result<RenderedPage> {
        let mut attempt = 0;
        loop {
            match self.client.content(url).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() && attempt + 1 < HEADLESS_MAX_ATTEMPTS => {
                    let backoff = HEADLESS_RETRY_BASE * 2u32.pow(attempt);
                    let jitter =
                        Duration::from_millis(rand::rng().random_range(0..HEADLESS_RETRY_JITTER_MS));
                    warn!(
                        url,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Headless render failed, retrying after backoff"
                    );
                    tokio::time::sleep(backoff + jitter).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn unblock(&self, url: &str) -> FetchResult {
        info!(url, strategy = "unblock", "Origin returned 403, escalating to unblock");
        match self.client.unblock(url).await {
            Ok(html) if !html.trim().is_empty() => {
                info!(url, strategy = "unblock", bytes = html.len(), "Fetched successfully");
                FetchResult::html(html)
            }
            Ok(_) => FetchResult::failure(
                FetchErrorCode::FetchFailed,
                "origin returned 403 and unblock returned no content",
            ),
            Err(e) => {
                let (code, message) = classify_error(&e);
                FetchResult::failure(code, format!("origin returned 403; unblock: {message}"))
            }
        }
    }
}

fn classify_error(err: &BrowserlessError) -> (FetchErrorCode, String) {
    let code = match err {
        BrowserlessError::Timeout => return (FetchErrorCode::Timeout, "render timed out".to_string()),
        BrowserlessError::Api { status, .. } if *status >= 500 || *status == 429 => {
            FetchErrorCode::ServerError
        }
        BrowserlessError::Api { .. } => FetchErrorCode::ClientError,
        BrowserlessError::Network(_) | BrowserlessError::Parse(_) => FetchErrorCode::FetchFailed,
    };
    (code, err.to_string())
}

#[async_trait]
impl FetchStrategy for HeadlessRender {
    async fn fetch(&self, url: &str) -> FetchResult {
        info!(url, strategy = "headless", "Rendering page");

        let page = match self.render_with_retry(url).await {
            Ok(page) => page,
            Err(e) => {
                let (code, message) = classify_error(&e);
                return FetchResult::failure(code, message);
            }
        };

        if page.is_origin_blocked() {
            return self.unblock(url).await;
        }

        match page.origin_status {
            Some(status) if (400..500).contains(&status) => {
                return FetchResult::failure(
                    FetchErrorCode::ClientError,
                    format!("origin HTTP {status}"),
                );
            }
            Some(status) if status >= 500 => {
                return FetchResult::failure(
                    FetchErrorCode::ServerError,
                    format!("origin HTTP {status}"),
                );
            }
            _ => {}
        }

        if page.html.trim().is_empty() {
            return FetchResult::failure(FetchErrorCode::FetchFailed, "empty render response");
        }

        info!(url, strategy = "headless", bytes = page.html.len(), "Rendered successfully");
        FetchResult::html(page.html)
    }

    fn name(&self) -> &str {
        "headless"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::DIRECT_FETCH_TIMEOUT;
    use crate::orchestrator::DEFAULT_SCRAPE_TIMEOUT;

    #[test]
    fn retry_fits_inside_outer_scrape_timeout() {
        let backoff: Duration = (0..HEADLESS_MAX_ATTEMPTS - 1)
            .map(|n| {
                HEADLESS_RETRY_BASE * 2u32.pow(n) + Duration::from_millis(HEADLESS_RETRY_JITTER_MS)
            })
            .sum();
        let worst_case =
            DIRECT_FETCH_TIMEOUT + HEADLESS_ATTEMPT_TIMEOUT * HEADLESS_MAX_ATTEMPTS + backoff;
        assert!(worst_case < DEFAULT_SCRAPE_TIMEOUT, "worst case {worst_case:?}");

        let options = render_options();
        let render = Duration::from_millis(
            options.navigation_timeout_ms + options.selector_timeout_ms + options.settle_ms,
        );
        assert!(render < HEADLESS_ATTEMPT_TIMEOUT, "render budget {render:?}");
    }

    fn strategy(server: &mockito::ServerGuard) -> HeadlessRender {
        HeadlessRender::new(&server.url(), None).unwrap()
    }

    #[tokio::test]
    async fn rendered_html_succeeds() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/content")
            .with_status(200)
            .with_header("X-Response-Code", "200")
            .with_body("<html><body>rendered</body></html>")
            .create_async()
            .await;

        let result = strategy(&server).fetch("https://example.com").await;
        assert_eq!(result, FetchResult::html("<html><body>rendered</body></html>"));
    }

    #[tokio::test]
    async fn wrapper_errors_retry_up_to_attempt_cap() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/content")
            .with_status(503)
            .expect(HEADLESS_MAX_ATTEMPTS as usize)
            .create_async()
            .await;

        let result = strategy(&server).fetch("https://example.com").await;
        mock.assert_async().await;
        assert!(matches!(
            result,
            FetchResult::Failure { code: FetchErrorCode::ServerError, .. }
        ));
    }

    #[tokio::test]
    async fn wrapper_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/content")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let result = strategy(&server).fetch("https://example.com").await;
        mock.assert_async().await;
        assert!(matches!(
            result,
            FetchResult::Failure { code: FetchErrorCode::ClientError, .. }
        ));
    }

    #[tokio::test]
    async fn origin_403_escalates_to_unblock() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/content")
            .with_status(200)
            .with_header("X-Response-Code", "403")
            .with_body("<html><body>Access denied</body></html>")
            .create_async()
            .await;
        let unblock = server
            .mock("POST", "/unblock")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"content":"<html><body>real page</body></html>"}"#)
            .expect(1)
            .create_async()
            .await;

        let result = strategy(&server).fetch("https://example.com").await;
        unblock.assert_async().await;
        assert_eq!(result, FetchResult::html("<html><body>real page</body></html>"));
    }

    #[tokio::test]
    async fn origin_404_is_client_error_without_unblock() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/content")
            .with_status(200)
            .with_header("X-Response-Code", "404")
            .with_body("<html><body>Not found</body></html>")
            .create_async()
            .await;
        let unblock = server
            .mock("POST", "/unblock")
            .match_query(mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let result = strategy(&server).fetch("https://example.com/missing").await;
        unblock.assert_async().await;
        assert!(matches!(
            result,
            FetchResult::Failure { code: FetchErrorCode::ClientError, .. }
        ));
    }

    #[tokio::test]
    async fn empty_render_is_fetch_failed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/content")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let result = strategy(&server).fetch("https://example.com").await;
        assert!(matches!(
            result,
            FetchResult::Failure { code: FetchErrorCode::FetchFailed, .. }
        ));
    }
}
