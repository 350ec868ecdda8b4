// Content-quality gate. Pure functions over cleaned text.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ExtractionError;

/// Cleaned content shorter than this is never accepted.
pub const MIN_CONTENT_CHARS: usize = 200;
/// The word-ratio check only applies past this many tokens.
pub const WORD_RATIO_MIN_TOKENS: usize = 50;
/// Minimum share of tokens that are alphabetic words.
pub const MIN_WORD_RATIO: f64 = 0.5;

static BUNDLER_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"__webpack_require__|webpackChunk|__NEXT_DATA__|self\.__next_f|__vite__|System\.register|\$RefreshReg\$|__turbopack",
    )
    .expect("valid regex")
});

static TRANSPORT_SIGNATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\d+:\["\$"|\$L\d+|\$Sreact\."#).expect("valid regex")
});

/// Why `text` reads like leaked code or payload rather than prose, if it does.
pub fn low_quality_reason(text: &str) -> Option<String> {
    if let Some(m) = BUNDLER_TOKEN_RE.find(text) {
        return Some(format!("bundler runtime token {:?}", m.as_str()));
    }
    if let Some(m) = TRANSPORT_SIGNATURE_RE.find(text) {
        return Some(format!("transport payload signature {:?}", m.as_str()));
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() > WORD_RATIO_MIN_TOKENS {
        let words = tokens.iter().filter(|t| is_word_token(t)).count();
        let ratio = words as f64 / tokens.len() as f64;
        if ratio < MIN_WORD_RATIO {
            return Some(format!("word ratio {ratio:.2} below {MIN_WORD_RATIO}"));
        }
    }
    None
}

/// A token that is a word once surrounding punctuation is trimmed.
fn is_word_token(token: &str) -> bool {
    let core = token.trim_matches(|c: char| !c.is_alphanumeric());
    !core.is_empty() && core.chars().all(|c| c.is_alphabetic() || c == '\'' || c == '-')
}

/// Length floor first, then the low-quality heuristics.
pub fn check(text: &str) -> Result<(), ExtractionError> {
    let length = text.chars().count();
    if length < MIN_CONTENT_CHARS {
        return Err(ExtractionError::ContentTooShort {
            length,
            minimum: MIN_CONTENT_CHARS,
        });
    }
    match low_quality_reason(text) {
        Some(reason) => Err(ExtractionError::QualityCheckFailed(reason)),
        None => Ok(()),
    }
}
