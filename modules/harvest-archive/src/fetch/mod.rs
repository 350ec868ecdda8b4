// Fetch strategies: one contract, two implementations.
// Failures are values the orchestrator branches on, never `Err`.

mod direct;
mod headless;

pub use direct::{DirectFetch, DIRECT_FETCH_TIMEOUT};
pub use headless::{
    HeadlessRender, HEADLESS_ATTEMPT_TIMEOUT, HEADLESS_MAX_ATTEMPTS, HEADLESS_RETRY_BASE,
};

use async_trait::async_trait;
use harvest_common::ScrapeErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorCode {
    ClientError,
    ServerError,
    Timeout,
    NotHtml,
    FetchFailed,
}

impl FetchErrorCode {
    /// Whether a failed direct fetch is worth retrying through headless render.
    /// `NotHtml` never is: the resource genuinely is not a web page.
    pub fn should_escalate(self) -> bool {
        matches!(
            self,
            FetchErrorCode::ClientError | FetchErrorCode::Timeout | FetchErrorCode::FetchFailed
        )
    }
}

impl From<FetchErrorCode> for ScrapeErrorCode {
    fn from(code: FetchErrorCode) -> Self {
        match code {
            FetchErrorCode::ClientError => ScrapeErrorCode::ClientError,
            FetchErrorCode::ServerError => ScrapeErrorCode::ServerError,
            FetchErrorCode::Timeout => ScrapeErrorCode::Timeout,
            FetchErrorCode::NotHtml => ScrapeErrorCode::NotHtml,
            FetchErrorCode::FetchFailed => ScrapeErrorCode::FetchFailed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    Success { html: String, content_type: String },
    Failure { code: FetchErrorCode, message: String },
}

impl FetchResult {
    pub fn html(html: impl Into<String>) -> Self {
        FetchResult::Success {
            html: html.into(),
            content_type: "text/html".to_string(),
        }
    }

    pub fn failure(code: FetchErrorCode, message: impl Into<String>) -> Self {
        FetchResult::Failure {
            code,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Retrieve HTML for an absolute http(s) URL. Must not panic or hang past
    /// the strategy's own timeout.
    async fn fetch(&self, url: &str) -> FetchResult;

    fn name(&self) -> &str;
}

/// `text/html` or XHTML. Parameters such as charset are ignored.
pub(crate) fn is_html_content_type(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.contains("text/html") || ct.contains("application/xhtml+xml")
}
