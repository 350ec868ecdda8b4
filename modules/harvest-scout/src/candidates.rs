use std::collections::HashMap;

use harvest_archive::normalize_url;
use harvest_common::{is_http_url, ScrapeCandidate, SearchResult};

/// Turn merged search results into the URLs worth scraping.
///
/// Duplicates (by normalized URL) collapse onto the first occurrence and keep
/// the highest score seen. Only http(s) URLs survive. The sort is stable, so
/// equal scores keep discovery order and the truncation is reproducible.
pub fn select_candidates(results: &[SearchResult], max: usize) -> Vec<ScrapeCandidate> {
    let mut candidates: Vec<ScrapeCandidate> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for result in results {
        if !is_http_url(&result.url) {
            continue;
        }
        let key = normalize_url(&result.url);
        match index_by_key.get(&key) {
            Some(&i) => {
                let existing = &mut candidates[i];
                if result.relevance_score > existing.relevance_score {
                    existing.relevance_score = result.relevance_score;
                }
            }
            None => {
                index_by_key.insert(key, candidates.len());
                candidates.push(ScrapeCandidate {
                    url: result.url.clone(),
                    relevance_score: result.relevance_score,
                });
            }
        }
    }

    candidates.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    candidates.truncate(max);
    candidates
}
