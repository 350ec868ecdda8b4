pub mod error;

pub use error::{BrowserlessError, Result};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Header carrying the origin site's status. The wrapper itself answers 200.
pub const ORIGIN_STATUS_HEADER: &str = "x-response-code";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Render options sent with every `/content` request.
///
/// `networkidle2` alone is not enough for streaming frameworks: the DOM-loaded
/// signal fires before they write visible markup, so the selector wait and the
/// settle delay are both required.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub wait_until: String,
    pub navigation_timeout_ms: u64,
    pub wait_selector: String,
    pub selector_timeout_ms: u64,
    pub settle_ms: u64,
    pub reject_resource_types: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            wait_until: "networkidle2".to_string(),
            navigation_timeout_ms: 20_000,
            wait_selector: "main, article, [role='main'], #content, body".to_string(),
            selector_timeout_ms: 5_000,
            settle_ms: 750,
            reject_resource_types: ["image", "stylesheet", "font", "media"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentRequest<'a> {
    url: &'a str,
    reject_resource_types: &'a [String],
    goto_options: GotoOptions<'a>,
    wait_for_selector: WaitForSelector<'a>,
    wait_for_timeout: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GotoOptions<'a> {
    wait_until: &'a str,
    timeout: u64,
}

#[derive(Debug, Serialize)]
struct WaitForSelector<'a> {
    selector: &'a str,
    timeout: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UnblockRequest<'a> {
    url: &'a str,
    content: bool,
    cookies: bool,
    screenshot: bool,
    #[serde(rename = "browserWSEndpoint")]
    browser_ws_endpoint: bool,
    ttl: u64,
}

#[derive(Debug, Deserialize)]
struct UnblockResponse {
    #[serde(default)]
    content: Option<String>,
}

/// HTML returned by `/content` plus the origin status the wrapper observed.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    pub origin_status: Option<u16>,
}

impl RenderedPage {
    pub fn is_origin_blocked(&self) -> bool {
        self.origin_status == Some(403)
    }
}

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    options: RenderOptions,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            options: RenderOptions::default(),
        })
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    fn token_query(&self) -> Vec<(&str, &str)> {
        self.token
            .as_deref()
            .map(|t| vec![("token", t)])
            .unwrap_or_default()
    }

    /// Fetch fully-rendered HTML for a URL via the `/content` endpoint.
    ///
    /// A non-2xx wrapper status is an error; the origin's own status is
    /// returned alongside the body for the caller to inspect.
    pub async fn content(&self, url: &str) -> Result<RenderedPage> {
        let endpoint = format!("{}/content", self.base_url);
        let body = ContentRequest {
            url,
            reject_resource_types: &self.options.reject_resource_types,
            goto_options: GotoOptions {
                wait_until: &self.options.wait_until,
                timeout: self.options.navigation_timeout_ms,
            },
            wait_for_selector: WaitForSelector {
                selector: &self.options.wait_selector,
                timeout: self.options.selector_timeout_ms,
            },
            wait_for_timeout: self.options.settle_ms,
        };

        let resp = self
            .client
            .post(&endpoint)
            .query(&self.token_query())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let origin_status = resp
            .headers()
            .get(ORIGIN_STATUS_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u16>().ok());

        let html = resp.text().await?;
        debug!(url, ?origin_status, bytes = html.len(), "browserless: content received");

        Ok(RenderedPage {
            html,
            origin_status,
        })
    }

    /// Fetch HTML through the `/unblock` endpoint using residential egress.
    /// Returns an empty string when the service answers without content.
    pub async fn unblock(&self, url: &str) -> Result<String> {
        let endpoint = format!("{}/unblock", self.base_url);
        let body = UnblockRequest {
            url,
            content: true,
            cookies: false,
            screenshot: false,
            browser_ws_endpoint: false,
            ttl: 0,
        };

        let mut query = self.token_query();
        query.push(("proxy", "residential"));

        let resp = self
            .client
            .post(&endpoint)
            .query(&query)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        let parsed: UnblockResponse = serde_json::from_str(&text)?;
        let html = parsed.content.unwrap_or_default();
        debug!(url, bytes = html.len(), "browserless: unblock content received");
        Ok(html)
    }
}
