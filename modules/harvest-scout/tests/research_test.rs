//! Research passes against mock searchers and scrapers. No network.

use std::sync::Arc;

use harvest_archive::degraded_response;
use harvest_archive::extract::SUMMARY_CHARS;
use harvest_common::{ScrapeErrorCode, ScrapeResult, SearchEnrichment};
use harvest_scout::testing::{hit, page, MockScraper, MockSearcher};
use harvest_scout::{ResearchEvent, ResearchExecutor, ResearchPlan};

fn plan(queries: &[&str], max_scrapes: usize) -> ResearchPlan {
    ResearchPlan::new(queries.iter().map(|q| q.to_string()).collect()).with_max_scrapes(max_scrapes)
}

#[tokio::test]
async fn full_pass_collects_results_and_content() {
    let searcher = Arc::new(
        MockSearcher::new()
            .on_query("warming centers", vec![hit("https://a.test/1", 0.9), hit("https://a.test/2", 0.4)])
            .on_query("winter shelter", vec![hit("https://b.test/1", 0.7), hit("https://a.test/1", 0.3)]),
    );
    let scraper = Arc::new(
        MockScraper::new()
            .on_page("https://a.test/1", page("A1", 800))
            .on_page("https://a.test/2", page("A2", 600))
            .on_page("https://b.test/1", page("B1", 700)),
    );
    let executor = ResearchExecutor::new(searcher.clone(), scraper.clone());

    let outcome = executor
        .run(&plan(&["warming centers", "winter shelter"], 10), None)
        .await;
    let data = outcome.harvested;

    assert_eq!(searcher.calls(), 2);
    assert_eq!(data.search_results.len(), 3);
    assert_eq!(data.scraped_content.len(), 3);
    assert!(data.failed_scrape_urls.is_empty());

    let mut scraped = scraper.scraped_urls();
    scraped.sort();
    assert_eq!(scraped, vec!["https://a.test/1", "https://a.test/2", "https://b.test/1"]);

    let top = &data.scraped_content[0];
    assert_eq!(top.url, "https://a.test/1");
    assert_eq!(top.relevance_score, 0.9);
    assert_eq!(top.content_length, 800);

    let ids: std::collections::HashSet<_> = data.scraped_content.iter().map(|c| c.context_id).collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(outcome.stats.scrapes_succeeded, 3);
}

#[tokio::test]
async fn failed_query_does_not_abort_the_pass() {
    let searcher = Arc::new(
        MockSearcher::new()
            .failing_on("broken")
            .on_query("fine", vec![hit("https://a.test/1", 0.5)]),
    );
    let scraper = Arc::new(MockScraper::new().on_page("https://a.test/1", page("A", 500)));
    let executor = ResearchExecutor::new(searcher, scraper);

    let outcome = executor.run(&plan(&["broken", "fine"], 5), None).await;

    assert_eq!(outcome.stats.queries_failed, 1);
    assert_eq!(outcome.harvested.search_results.len(), 1);
    assert_eq!(outcome.harvested.scraped_content.len(), 1);
}

#[tokio::test]
async fn failed_and_thin_scrapes_are_recorded_not_kept() {
    let searcher = Arc::new(MockSearcher::new().on_query(
        "q",
        vec![
            hit("https://ok.test", 0.9),
            hit("https://thin.test", 0.8),
            hit("https://down.test", 0.7),
        ],
    ));
    let scraper = Arc::new(
        MockScraper::new()
            .on_page("https://ok.test", page("OK", 1000))
            .on_page("https://thin.test", page("Thin", 50))
            .on_page(
                "https://down.test",
                ScrapeResult::failure("https://down.test", ScrapeErrorCode::ServerError, "direct: HTTP 502"),
            ),
    );
    let executor = ResearchExecutor::new(searcher, scraper);

    let outcome = executor.run(&plan(&["q"], 5), None).await;
    let data = outcome.harvested;

    assert_eq!(data.scraped_content.len(), 1);
    assert_eq!(data.scraped_content[0].url, "https://ok.test");
    assert!(data.failed_scrape_urls.contains("https://thin.test"));
    assert!(data.failed_scrape_urls.contains("https://down.test"));
    assert_eq!(data.failed_scrape_errors["https://down.test"], "direct: HTTP 502");
    assert!(data.failed_scrape_errors["https://thin.test"].contains("too short"));
    assert_eq!(outcome.stats.scrapes_failed, 2);
}

#[tokio::test]
async fn scrapes_are_capped_to_top_candidates() {
    let searcher = Arc::new(MockSearcher::new().on_query(
        "q",
        vec![
            hit("https://low.test", 0.1),
            hit("https://high.test", 0.9),
            hit("https://mid.test", 0.5),
        ],
    ));
    let scraper = Arc::new(MockScraper::new());
    let executor = ResearchExecutor::new(searcher, scraper.clone());

    executor.run(&plan(&["q"], 2), None).await;

    let mut scraped = scraper.scraped_urls();
    scraped.sort();
    assert_eq!(scraped, vec!["https://high.test", "https://mid.test"]);
}

#[tokio::test]
async fn first_enrichment_wins() {
    let first = SearchEnrichment {
        answer_box: Some(serde_json::json!({"answer": "first"})),
        ..Default::default()
    };
    let second = SearchEnrichment {
        answer_box: Some(serde_json::json!({"answer": "second"})),
        ..Default::default()
    };
    let searcher = Arc::new(
        MockSearcher::new()
            .on_query("a", vec![])
            .on_query_with_enrichment("b", vec![hit("https://b.test", 0.5)], first)
            .on_query_with_enrichment("c", vec![hit("https://c.test", 0.5)], second),
    );
    let executor = ResearchExecutor::new(searcher, Arc::new(MockScraper::new()));

    let outcome = executor.run(&plan(&["a", "b", "c"], 0), None).await;

    let enrichment = outcome.harvested.enrichment.unwrap();
    assert_eq!(enrichment.answer_box.unwrap()["answer"], "first");
}

#[tokio::test]
async fn degraded_results_are_reported_but_never_scraped() {
    let searcher = Arc::new(MockSearcher::new().on_response("nothing", degraded_response("nothing")));
    let scraper = Arc::new(MockScraper::new());
    let executor = ResearchExecutor::new(searcher, scraper.clone());

    let outcome = executor.run(&plan(&["nothing"], 5), None).await;

    assert_eq!(outcome.harvested.search_results.len(), 1);
    assert_eq!(outcome.stats.queries_degraded, 1);
    assert!(scraper.scraped_urls().is_empty());
}

#[tokio::test]
async fn progress_events_arrive_at_phase_boundaries() {
    let searcher = Arc::new(MockSearcher::new().on_query("q", vec![hit("https://a.test", 0.5)]));
    let scraper = Arc::new(MockScraper::new().on_page("https://a.test", page("A", 400)));
    let executor = ResearchExecutor::new(searcher, scraper);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    executor.run(&plan(&["q", "r"], 5), Some(&tx)).await;
    drop(tx);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 4);
    assert_eq!(events[0], ResearchEvent::SearchStarted { queries: 2 });
    assert!(matches!(
        events[1],
        ResearchEvent::SearchCompleted { total_results: 1, failed_queries: 0, .. }
    ));
    assert_eq!(events[2], ResearchEvent::ScrapeStarted { candidates: 1 });
    assert!(matches!(
        events[3],
        ResearchEvent::ScrapeCompleted { succeeded: 1, failed: 0, .. }
    ));
}

#[tokio::test]
async fn closed_progress_receiver_is_harmless() {
    let searcher = Arc::new(MockSearcher::new().on_query("q", vec![hit("https://a.test", 0.5)]));
    let scraper = Arc::new(MockScraper::new().on_page("https://a.test", page("A", 400)));
    let executor = ResearchExecutor::new(searcher, scraper);
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    drop(rx);

    let outcome = executor.run(&plan(&["q"], 5), Some(&tx)).await;
    assert_eq!(outcome.harvested.scraped_content.len(), 1);
}

#[tokio::test]
async fn harvested_data_serializes_camel_case() {
    let searcher = Arc::new(MockSearcher::new().on_query("q", vec![hit("https://a.test", 0.5)]));
    let scraper = Arc::new(MockScraper::new().on_page("https://a.test", page("A", 400)));
    let executor = ResearchExecutor::new(searcher, scraper);

    let outcome = executor.run(&plan(&["q"], 5), None).await;
    let json = serde_json::to_value(&outcome.harvested).unwrap();

    assert!(json["searchResults"][0]["relevanceScore"].is_number());
    assert_eq!(json["scrapedContent"][0]["contentLength"], 400);
    assert!(json["scrapedContent"][0]["contextId"].is_string());
    assert!(json["failedScrapeUrls"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn missing_summary_is_filled_from_content_prefix() {
    let mut unsummarized = page("A", 1000);
    unsummarized.summary = None;
    let searcher = Arc::new(MockSearcher::new().on_query("q", vec![hit("https://a.test", 0.5)]));
    let scraper = Arc::new(MockScraper::new().on_page("https://a.test", unsummarized.clone()));
    let executor = ResearchExecutor::new(searcher, scraper);

    let outcome = executor.run(&plan(&["q"], 5), None).await;
    let scraped = &outcome.harvested.scraped_content[0];

    assert_eq!(scraped.summary.chars().count(), SUMMARY_CHARS);
    assert!(unsummarized.content.starts_with(&scraped.summary));
}
