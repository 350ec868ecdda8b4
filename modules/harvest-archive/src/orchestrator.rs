//! Scrape orchestration: cache, strategy fallback, extraction.
//!
//! Direct fetch is always tried first. Headless render runs when direct
//! fetch fails with an escalatable code, or when it succeeds but the page
//! fails extraction (JS-only shells answer 200 with an empty body). The whole
//! chain runs against one outer deadline and every final outcome is cached.

use std::sync::Arc;
use std::time::Duration;

use harvest_common::{is_http_url, Config, ScrapeErrorCode, ScrapeResult};
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

use crate::cache::{CacheSettings, ScrapeCache};
use crate::extract::extract;
use crate::fetch::{DirectFetch, FetchResult, FetchStrategy, HeadlessRender};

pub const DEFAULT_SCRAPE_TIMEOUT: Duration = Duration::from_secs(35);

pub struct Scraper {
    direct: Arc<dyn FetchStrategy>,
    fallback: Option<Arc<dyn FetchStrategy>>,
    cache: Arc<ScrapeCache>,
    timeout: Duration,
}

/// One failed path: which strategy, what went wrong.
struct Attempt {
    strategy: String,
    code: ScrapeErrorCode,
    message: String,
}

impl Scraper {
    pub fn new(
        direct: Arc<dyn FetchStrategy>,
        fallback: Option<Arc<dyn FetchStrategy>>,
        cache: Arc<ScrapeCache>,
    ) -> Self {
        Self {
            direct,
            fallback,
            cache,
            timeout: DEFAULT_SCRAPE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Direct fetch plus headless render when `BROWSERLESS_URL` is set.
    pub fn from_config(config: &Config) -> crate::error::Result<Self> {
        let direct: Arc<dyn FetchStrategy> = Arc::new(DirectFetch::new()?);
        let fallback: Option<Arc<dyn FetchStrategy>> = match &config.browserless_url {
            Some(url) => Some(Arc::new(HeadlessRender::new(
                url,
                config.browserless_token.as_deref(),
            )?)),
            None => {
                warn!("BROWSERLESS_URL not set, headless render fallback disabled");
                None
            }
        };
        let cache = Arc::new(ScrapeCache::new(CacheSettings::from_config(config)));
        Ok(Self::new(direct, fallback, cache).with_timeout(config.scrape_timeout))
    }

    pub fn cache(&self) -> &Arc<ScrapeCache> {
        &self.cache
    }

    /// Scrape `url`. Always returns a well-formed result, within the outer
    /// timeout.
    pub async fn scrape(&self, url: &str) -> ScrapeResult {
        if !is_http_url(url) {
            warn!(url, "Rejecting non-http(s) URL");
            return ScrapeResult::failure(
                url,
                ScrapeErrorCode::InvalidUrl,
                "URL must be an absolute http(s) URL",
            );
        }

        if let Some(hit) = self.cache.get(url) {
            info!(url, failed = hit.is_failure(), "Scrape cache hit");
            return hit;
        }

        let result = self.scrape_uncached(url).await;
        self.cache.insert(url, result.clone());
        result
    }

    /// Both paths share one deadline. Attempts recorded before it expires
    /// stay in the final failure message.
    async fn scrape_uncached(&self, url: &str) -> ScrapeResult {
        let deadline = Instant::now() + self.timeout;
        let mut attempts: Vec<Attempt> = Vec::new();

        let Ok(outcome) = timeout_at(deadline, self.try_strategy(self.direct.as_ref(), url)).await
        else {
            return self.timed_out(url, attempts);
        };
        match outcome {
            Ok(result) => return result,
            Err(attempt) => {
                let escalate = attempt.escalates;
                attempts.push(attempt.inner);
                if !escalate {
                    return final_failure(url, &attempts);
                }
            }
        }

        let Some(fallback) = &self.fallback else {
            return final_failure(url, &attempts);
        };

        info!(url, from = self.direct.name(), to = fallback.name(), "Falling back");
        let Ok(outcome) = timeout_at(deadline, self.try_strategy(fallback.as_ref(), url)).await
        else {
            return self.timed_out(url, attempts);
        };
        match outcome {
            Ok(result) => result,
            Err(attempt) => {
                attempts.push(attempt.inner);
                final_failure(url, &attempts)
            }
        }
    }

    fn timed_out(&self, url: &str, mut attempts: Vec<Attempt>) -> ScrapeResult {
        warn!(url, timeout_secs = self.timeout.as_secs(), "Scrape timed out");
        attempts.push(Attempt {
            strategy: "outer".to_string(),
            code: ScrapeErrorCode::Timeout,
            message: format!("exceeded {}s", self.timeout.as_secs()),
        });
        final_failure(url, &attempts)
    }

    /// Fetch and extract through one strategy.
    async fn try_strategy(
        &self,
        strategy: &dyn FetchStrategy,
        url: &str,
    ) -> Result<ScrapeResult, FailedAttempt> {
        match strategy.fetch(url).await {
            FetchResult::Success { html, .. } => match extract(&html, url) {
                Ok(page) => {
                    info!(
                        url,
                        strategy = strategy.name(),
                        chars = page.content.chars().count(),
                        needs_js = page.needs_js_rendering,
                        "Scrape succeeded"
                    );
                    Ok(page.into_result())
                }
                Err(e) => {
                    warn!(url, strategy = strategy.name(), error = %e, "Extraction rejected page");
                    Err(FailedAttempt {
                        inner: Attempt {
                            strategy: strategy.name().to_string(),
                            code: e.code(),
                            message: e.to_string(),
                        },
                        escalates: true,
                    })
                }
            },
            FetchResult::Failure { code, message } => {
                warn!(url, strategy = strategy.name(), ?code, error = %message, "Fetch failed");
                Err(FailedAttempt {
                    inner: Attempt {
                        strategy: strategy.name().to_string(),
                        code: code.into(),
                        message,
                    },
                    escalates: code.should_escalate(),
                })
            }
        }
    }
}

struct FailedAttempt {
    inner: Attempt,
    escalates: bool,
}

/// Failure carrying every attempted path; the code is the last path's.
fn final_failure(url: &str, attempts: &[Attempt]) -> ScrapeResult {
    let message = attempts
        .iter()
        .map(|a| format!("{}: {}", a.strategy, a.message))
        .collect::<Vec<_>>()
        .join("; ");
    let code = attempts
        .last()
        .map(|a| a.code)
        .unwrap_or(ScrapeErrorCode::FetchFailed);
    ScrapeResult::failure(url, code, message)
}
