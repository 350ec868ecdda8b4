//! Parallel research pass.
//!
//! Phase 1 fans every query out to the searcher; phase 2 scrapes the best
//! candidates drawn from the merged results. Both phases are bounded with
//! `buffer_unordered` and tolerate partial failure: a failed query or scrape
//! is counted and logged, never fatal to the pass.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use harvest_archive::extract::{MIN_CONTENT_CHARS, SUMMARY_CHARS};
use harvest_archive::{normalize_url, FALLBACK_PROVIDER};
use harvest_common::{Config, HarvestedData, ScrapedContent, SearchResult};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::candidates::select_candidates;
use crate::events::{emit, ResearchEvent};
use crate::stats::ResearchStats;
use crate::traits::{PageScraper, WebSearcher};

/// What to research: the queries plus per-pass caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchPlan {
    pub queries: Vec<String>,
    pub max_scrapes: usize,
    pub results_per_query: usize,
}

impl ResearchPlan {
    pub fn new(queries: Vec<String>) -> Self {
        Self {
            queries,
            max_scrapes: 8,
            results_per_query: 8,
        }
    }

    pub fn from_config(queries: Vec<String>, config: &Config) -> Self {
        Self {
            queries,
            max_scrapes: config.research_max_scrapes,
            results_per_query: config.research_results_per_query,
        }
    }

    pub fn with_max_scrapes(mut self, max_scrapes: usize) -> Self {
        self.max_scrapes = max_scrapes;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResearchSettings {
    pub search_concurrency: usize,
    pub scrape_concurrency: usize,
    /// Scrapes with less content than this count as failed.
    pub min_content_chars: usize,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            search_concurrency: 5,
            scrape_concurrency: 4,
            min_content_chars: MIN_CONTENT_CHARS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub harvested: HarvestedData,
    pub stats: ResearchStats,
}

pub struct ResearchExecutor {
    searcher: Arc<dyn WebSearcher>,
    scraper: Arc<dyn PageScraper>,
    settings: ResearchSettings,
}

impl ResearchExecutor {
    pub fn new(searcher: Arc<dyn WebSearcher>, scraper: Arc<dyn PageScraper>) -> Self {
        Self {
            searcher,
            scraper,
            settings: ResearchSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ResearchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Run one research pass. Progress events go to `progress` when given.
    pub async fn run(
        &self,
        plan: &ResearchPlan,
        progress: Option<&UnboundedSender<ResearchEvent>>,
    ) -> ResearchOutcome {
        let mut harvested = HarvestedData::default();
        let mut stats = ResearchStats {
            queries: plan.queries.len() as u32,
            ..Default::default()
        };

        let pool = self.search_phase(plan, progress, &mut harvested, &mut stats).await;
        self.scrape_phase(plan, &pool, progress, &mut harvested, &mut stats)
            .await;

        stats.content_chars = harvested.total_content_chars() as u64;
        info!("{stats}");
        ResearchOutcome { harvested, stats }
    }

    /// Returns the candidate pool: every real (non-degraded) search hit.
    async fn search_phase(
        &self,
        plan: &ResearchPlan,
        progress: Option<&UnboundedSender<ResearchEvent>>,
        harvested: &mut HarvestedData,
        stats: &mut ResearchStats,
    ) -> Vec<SearchResult> {
        emit(
            progress,
            ResearchEvent::SearchStarted {
                queries: plan.queries.len(),
            },
        );
        let started = Instant::now();

        let searcher = &self.searcher;
        let mut responses: Vec<_> = stream::iter(plan.queries.iter().enumerate().map(
            |(i, query)| async move {
                (i, query, searcher.search(query, plan.results_per_query).await)
            },
        ))
        .buffer_unordered(self.settings.search_concurrency.max(1))
        .collect()
        .await;
        // Arrival order is arbitrary; merge in plan order so the pass is reproducible.
        responses.sort_by_key(|(i, _, _)| *i);

        let mut pool = Vec::new();
        let mut seen_urls = HashSet::new();
        for (_, query, result) in responses {
            match result {
                Ok(resp) => {
                    info!(
                        query = query.as_str(),
                        provider = resp.provider.as_str(),
                        count = resp.results.len(),
                        "Search complete"
                    );
                    if harvested.enrichment.is_none() {
                        harvested.enrichment = resp.enrichment;
                    }
                    let degraded = resp.provider == FALLBACK_PROVIDER;
                    if degraded {
                        stats.queries_degraded += 1;
                    }
                    for result in resp.results {
                        if seen_urls.insert(normalize_url(&result.url)) {
                            harvested.search_results.push(result.clone());
                        }
                        if !degraded {
                            pool.push(result);
                        }
                    }
                }
                Err(e) => {
                    warn!(query = query.as_str(), error = %e, "Search query failed");
                    stats.queries_failed += 1;
                }
            }
        }

        stats.search_results = harvested.search_results.len() as u32;
        stats.search_ms = started.elapsed().as_millis() as u64;
        emit(
            progress,
            ResearchEvent::SearchCompleted {
                total_results: harvested.search_results.len(),
                failed_queries: stats.queries_failed as usize,
                elapsed_ms: stats.search_ms,
            },
        );
        pool
    }

    async fn scrape_phase(
        &self,
        plan: &ResearchPlan,
        pool: &[SearchResult],
        progress: Option<&UnboundedSender<ResearchEvent>>,
        harvested: &mut HarvestedData,
        stats: &mut ResearchStats,
    ) {
        let candidates = select_candidates(pool, plan.max_scrapes);
        stats.candidates = candidates.len() as u32;
        emit(
            progress,
            ResearchEvent::ScrapeStarted {
                candidates: candidates.len(),
            },
        );
        let started = Instant::now();

        let scraper = &self.scraper;
        let outcomes: Vec<_> = stream::iter(candidates.into_iter().map(|candidate| async move {
            let result = scraper.scrape(&candidate.url).await;
            (candidate, result)
        }))
        .buffer_unordered(self.settings.scrape_concurrency.max(1))
        .collect()
        .await;

        for (candidate, result) in outcomes {
            if let Some(error) = &result.error {
                warn!(url = candidate.url.as_str(), error = error.as_str(), "Scrape failed");
                harvested.record_failure(&candidate.url, error.clone());
                stats.scrapes_failed += 1;
                continue;
            }

            let content_length = result.content_length();
            if content_length < self.settings.min_content_chars {
                warn!(
                    url = candidate.url.as_str(),
                    content_length, "Scrape rejected, content too short"
                );
                harvested.record_failure(
                    &candidate.url,
                    format!(
                        "content too short ({content_length} chars, minimum {})",
                        self.settings.min_content_chars
                    ),
                );
                stats.scrapes_failed += 1;
                continue;
            }

            let summary = result
                .summary
                .unwrap_or_else(|| result.content.chars().take(SUMMARY_CHARS).collect());
            harvested.scraped_content.push(ScrapedContent {
                url: candidate.url,
                title: result.title,
                content: result.content,
                summary,
                content_length,
                scraped_at: Utc::now(),
                context_id: Uuid::new_v4(),
                relevance_score: candidate.relevance_score,
            });
            stats.scrapes_succeeded += 1;
        }

        harvested
            .scraped_content
            .sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

        stats.scrape_ms = started.elapsed().as_millis() as u64;
        emit(
            progress,
            ResearchEvent::ScrapeCompleted {
                succeeded: stats.scrapes_succeeded as usize,
                failed: stats.scrapes_failed as usize,
                elapsed_ms: stats.scrape_ms,
            },
        );
    }
}
