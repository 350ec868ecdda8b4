use harvest_common::ScrapeErrorCode;

/// Result type alias for archive construction and provider plumbing.
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Headless render client error: {0}")]
    Browserless(#[from] browserless_client::BrowserlessError),
}

/// Raised by the content extractor when HTML produced nothing usable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error("content too short ({length} chars, minimum {minimum})")]
    ContentTooShort { length: usize, minimum: usize },

    #[error("content failed quality check: {0}")]
    QualityCheckFailed(String),
}

impl ExtractionError {
    pub fn code(&self) -> ScrapeErrorCode {
        match self {
            ExtractionError::ContentTooShort { .. } => ScrapeErrorCode::ContentTooShort,
            ExtractionError::QualityCheckFailed(_) => ScrapeErrorCode::QualityCheckFailed,
        }
    }
}
