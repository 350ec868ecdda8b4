use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// Coarse progress of one research pass, emitted at phase boundaries only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResearchEvent {
    SearchStarted {
        queries: usize,
    },
    SearchCompleted {
        total_results: usize,
        failed_queries: usize,
        elapsed_ms: u64,
    },
    ScrapeStarted {
        candidates: usize,
    },
    ScrapeCompleted {
        succeeded: usize,
        failed: usize,
        elapsed_ms: u64,
    },
}

/// Send if anyone is listening. A dropped receiver is not an error.
pub(crate) fn emit(progress: Option<&UnboundedSender<ResearchEvent>>, event: ResearchEvent) {
    if let Some(tx) = progress {
        let _ = tx.send(event);
    }
}
