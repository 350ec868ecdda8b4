pub mod candidates;
pub mod events;
pub mod research;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use candidates::select_candidates;
pub use events::ResearchEvent;
pub use research::{ResearchExecutor, ResearchOutcome, ResearchPlan, ResearchSettings};
pub use stats::ResearchStats;
pub use traits::{PageScraper, WebSearcher};
