pub mod cache;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod orchestrator;
pub mod search;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use cache::{normalize_url, CacheSettings, ScrapeCache};
pub use error::{ArchiveError, ExtractionError, Result};
pub use extract::{extract, ExtractedPage};
pub use fetch::{DirectFetch, FetchErrorCode, FetchResult, FetchStrategy, HeadlessRender};
pub use orchestrator::{Scraper, DEFAULT_SCRAPE_TIMEOUT};
pub use search::{
    degraded_response, SearchChain, SearchProvider, SerperProvider, TavilyProvider,
    FALLBACK_PROVIDER,
};
