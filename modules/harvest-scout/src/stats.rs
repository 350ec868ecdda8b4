/// Stats from a research pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResearchStats {
    pub queries: u32,
    pub queries_failed: u32,
    pub queries_degraded: u32,
    pub search_results: u32,
    pub candidates: u32,
    pub scrapes_succeeded: u32,
    pub scrapes_failed: u32,
    pub content_chars: u64,
    pub search_ms: u64,
    pub scrape_ms: u64,
}

impl std::fmt::Display for ResearchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Research Pass Complete ===")?;
        writeln!(f, "Queries:            {}", self.queries)?;
        writeln!(f, "Queries failed:     {}", self.queries_failed)?;
        if self.queries_degraded > 0 {
            writeln!(f, "Queries degraded:   {}", self.queries_degraded)?;
        }
        writeln!(f, "Search results:     {}", self.search_results)?;
        writeln!(f, "Scrape candidates:  {}", self.candidates)?;
        writeln!(f, "Scrapes succeeded:  {}", self.scrapes_succeeded)?;
        writeln!(f, "Scrapes failed:     {}", self.scrapes_failed)?;
        writeln!(f, "Content chars:      {}", self.content_chars)?;
        writeln!(f, "\nTiming:")?;
        writeln!(f, "  Search: {}ms", self.search_ms)?;
        write!(f, "  Scrape: {}ms", self.scrape_ms)
    }
}
