//! Decoding of streamed script payloads.
//!
//! Streaming frameworks ship page content as `self.__next_f.push([1,"..."])`
//! calls whose string element holds a serialized component tree. The readable
//! text sits in quoted string literals inside that tree, mixed with module
//! paths, asset URLs and reference markers that must be filtered out.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::text::clean_text;

/// Shortest string literal considered as a text fragment.
pub const MIN_FRAGMENT_CHARS: usize = 40;
/// Fragments kept after deduplication.
pub const MAX_FRAGMENTS: usize = 200;
/// Minimum share of letters among non-space characters.
pub const MIN_LETTER_RATIO: f64 = 0.5;
/// Maximum ratio of symbol characters to letters.
pub const MAX_SYMBOL_RATIO: f64 = 0.25;
pub const MIN_DISTINCT_WORDS: usize = 5;

const PATH_PREFIXES: &[&str] = &[
    "/", "./", "../", "http", "$", "static/", "_next/", "data:", "{", "[",
];

static PUSH_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"self\.__next_f\.push\(").expect("valid regex"));

// JS `\xHH` escapes are not valid JSON.
static HEX_ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\x([0-9a-fA-F]{2})").expect("valid regex"));

static STRING_LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#""((?:[^"\\]|\\.){{{MIN_FRAGMENT_CHARS},}})""#)).expect("valid regex")
});

/// Concatenated string payloads of every push call, in document order.
pub(crate) fn decode_chunks(raw_html: &str) -> String {
    let normalized = HEX_ESCAPE_RE.replace_all(raw_html, r"\u00$1");

    let mut combined = String::new();
    for call in PUSH_CALL_RE.find_iter(&normalized) {
        let rest = &normalized[call.end()..];
        let Some(Ok(Value::Array(args))) =
            serde_json::Deserializer::from_str(rest).into_iter::<Value>().next()
        else {
            continue;
        };
        if let Some(chunk) = args.get(1).and_then(Value::as_str) {
            combined.push_str(chunk);
        }
    }
    combined
}

/// Readable prose hidden in streamed payloads, or `None` when there is none.
pub(crate) fn extract_streaming_text(raw_html: &str) -> Option<String> {
    let combined = decode_chunks(raw_html);
    if combined.is_empty() {
        return None;
    }

    let mut seen = HashSet::new();
    let fragments: Vec<String> = STRING_LITERAL_RE
        .captures_iter(&combined)
        .map(|c| unescape_literal(&c[1]))
        .map(|s| s.trim().to_string())
        .filter(|s| is_readable_fragment(s))
        .filter(|s| seen.insert(s.clone()))
        .take(MAX_FRAGMENTS)
        .collect();

    if fragments.is_empty() {
        return None;
    }
    Some(clean_text(&fragments.join(" ")))
}

fn unescape_literal(body: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{body}\"")).unwrap_or_else(|_| body.to_string())
}

/// Whether a decoded literal reads like prose rather than code, paths or ids.
pub fn is_readable_fragment(s: &str) -> bool {
    if s.chars().count() < MIN_FRAGMENT_CHARS {
        return false;
    }
    if PATH_PREFIXES.iter().any(|p| s.starts_with(p)) {
        return false;
    }

    let mut letters = 0usize;
    let mut non_space = 0usize;
    let mut symbols = 0usize;
    for c in s.chars() {
        if c.is_whitespace() {
            continue;
        }
        non_space += 1;
        if c.is_alphabetic() {
            letters += 1;
        } else if !c.is_numeric() && !is_prose_punctuation(c) {
            symbols += 1;
        }
    }
    if letters == 0 || (letters as f64) < MIN_LETTER_RATIO * non_space as f64 {
        return false;
    }
    if symbols as f64 / letters as f64 > MAX_SYMBOL_RATIO {
        return false;
    }

    let distinct_words: HashSet<String> = s
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphabetic()))
        .filter(|w| w.chars().count() >= 2 && w.chars().all(char::is_alphabetic))
        .map(str::to_lowercase)
        .collect();
    distinct_words.len() >= MIN_DISTINCT_WORDS
}

fn is_prose_punctuation(c: char) -> bool {
    matches!(
        c,
        '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' | '-' | '(' | ')' | '\u{2019}' | '\u{2014}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_push_chunks_in_order() {
        let html = r#"<script>self.__next_f.push([1,"first "])</script>
                      <script>self.__next_f.push([1,"second"])</script>"#;
        assert_eq!(decode_chunks(html), "first second");
    }

    #[test]
    fn hex_escapes_are_normalized() {
        let html = r#"<script>self.__next_f.push([1,"fish \x26 chips"])</script>"#;
        assert_eq!(decode_chunks(html), "fish & chips");
    }

    #[test]
    fn malformed_chunks_are_skipped() {
        let html = r#"<script>self.__next_f.push([1,"ok"</script><script>self.__next_f.push([1,"fine"])</script>"#;
        assert_eq!(decode_chunks(html), "fine");
    }

    #[test]
    fn readable_fragment_filter() {
        assert!(is_readable_fragment(
            "The council approved the new community garden on Tuesday evening."
        ));
        assert!(!is_readable_fragment("/_next/static/chunks/app/page-4f2a9c1e8b7d6a5f.js"));
        assert!(!is_readable_fragment("$L4f2a9c1e8b7d6a5f3e2d1c0b9a8f7e6d5c4b3a2f1e0d"));
        assert!(!is_readable_fragment("a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6e7f8a9b0c1d2e3"));
        assert!(!is_readable_fragment("too short to matter"));
        assert!(!is_readable_fragment(
            "flex items-center justify-between px-4 py-2 md:px-8 lg:grid-cols-3"
        ));
    }

    #[test]
    fn extracts_article_text_and_drops_noise() {
        let sentence = "Residents gathered at the library to plan the spring river cleanup together.";
        let html = format!(
            r#"<script>self.__next_f.push([1,"0:[\"$\",\"div\",null,{{\"children\":\"{sentence}\"}}]\n"])</script>
               <script>self.__next_f.push([1,"1:I[\"/_next/static/chunks/app/layout-0123456789abcdef.js\"]\n"])</script>"#
        );
        let text = extract_streaming_text(&html).unwrap();
        assert_eq!(text, sentence);
    }

    #[test]
    fn no_payload_yields_none() {
        assert!(extract_streaming_text("<html><body>plain</body></html>").is_none());
    }
}
