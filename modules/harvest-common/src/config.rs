use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::HarvestError;

/// Application configuration loaded from environment variables.
/// Every key is optional: missing search keys disable that provider, a
/// missing `BROWSERLESS_URL` disables headless rendering.
#[derive(Debug, Clone)]
pub struct Config {
    // Headless rendering
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,

    // Search providers
    pub serper_api_key: Option<String>,
    pub tavily_api_key: Option<String>,

    // Scrape cache
    pub cache_capacity: usize,
    pub cache_success_ttl: Duration,
    pub cache_failure_ttl: Duration,

    // Scraping
    pub scrape_timeout: Duration,

    // Research
    pub research_max_scrapes: usize,
    pub research_results_per_query: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browserless_url: None,
            browserless_token: None,
            serper_api_key: None,
            tavily_api_key: None,
            cache_capacity: 200,
            cache_success_ttl: Duration::from_secs(30 * 60),
            cache_failure_ttl: Duration::from_secs(5 * 60),
            scrape_timeout: Duration::from_secs(35),
            research_max_scrapes: 8,
            research_results_per_query: 8,
        }
    }
}

impl Config {
    /// Load configuration from the environment (and `.env` when present).
    pub fn from_env() -> Result<Self, HarvestError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            browserless_url: optional_env("BROWSERLESS_URL"),
            browserless_token: optional_env("BROWSERLESS_TOKEN"),
            serper_api_key: optional_env("SERPER_API_KEY"),
            tavily_api_key: optional_env("TAVILY_API_KEY"),
            cache_capacity: parsed_env("SCRAPE_CACHE_CAPACITY", defaults.cache_capacity)?,
            cache_success_ttl: Duration::from_secs(parsed_env(
                "SCRAPE_CACHE_SUCCESS_TTL_SECS",
                defaults.cache_success_ttl.as_secs(),
            )?),
            cache_failure_ttl: Duration::from_secs(parsed_env(
                "SCRAPE_CACHE_FAILURE_TTL_SECS",
                defaults.cache_failure_ttl.as_secs(),
            )?),
            scrape_timeout: Duration::from_secs(parsed_env(
                "SCRAPE_TIMEOUT_SECS",
                defaults.scrape_timeout.as_secs(),
            )?),
            research_max_scrapes: parsed_env("RESEARCH_MAX_SCRAPES", defaults.research_max_scrapes)?,
            research_results_per_query: parsed_env(
                "RESEARCH_RESULTS_PER_QUERY",
                defaults.research_results_per_query,
            )?,
        };

        if config.cache_capacity == 0 {
            return Err(HarvestError::Config(
                "SCRAPE_CACHE_CAPACITY must be at least 1".to_string(),
            ));
        }

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => {
                    let n = v.char_indices().nth(5).map(|(i, _)| i).unwrap_or(v.len());
                    format!("{}...({} chars)", &v[..n], v.len())
                }
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  BROWSERLESS_URL: {}", self.browserless_url.as_deref().unwrap_or("<not set>"));
        tracing::info!("  BROWSERLESS_TOKEN: {}", preview_opt(&self.browserless_token));
        tracing::info!("  SERPER_API_KEY: {}", preview_opt(&self.serper_api_key));
        tracing::info!("  TAVILY_API_KEY: {}", preview_opt(&self.tavily_api_key));
        tracing::info!(
            capacity = self.cache_capacity,
            success_ttl_secs = self.cache_success_ttl.as_secs(),
            failure_ttl_secs = self.cache_failure_ttl.as_secs(),
            "  scrape cache"
        );
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T: FromStr>(key: &str, default: T) -> Result<T, HarvestError> {
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| HarvestError::Config(format!("{key} must be a number, got {raw:?}"))),
        None => Ok(default),
    }
}
