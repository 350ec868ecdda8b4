//! HTML to bounded, readable text.
//!
//! Order matters: title and the JS-rendering check read the raw document,
//! streamed payloads are decoded from script tags, and only then is junk
//! (scripts included) stripped for main-content selection.

mod js_detect;
mod main_content;
pub mod quality;
mod stream_payload;
pub mod text;

use std::sync::LazyLock;

use harvest_common::ScrapeResult;
use scraper::{Html, Selector};
use tracing::debug;

use crate::error::ExtractionError;

pub use js_detect::SPA_MIN_BODY_TEXT;
pub use main_content::MAIN_CONTENT_MIN_CHARS;
pub use quality::MIN_CONTENT_CHARS;
pub use stream_payload::is_readable_fragment;

/// Content is cut to this many characters.
pub const MAX_CONTENT_CHARS: usize = 12_000;
/// Length of the summary prefix.
pub const SUMMARY_CHARS: usize = 300;

static OG_TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:title"]"#).expect("BUG: og:title selector is invalid")
});

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("title").expect("BUG: hardcoded CSS selector 'title' is invalid")
});

static H1_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1").expect("BUG: hardcoded CSS selector 'h1' is invalid")
});

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub needs_js_rendering: bool,
}

impl ExtractedPage {
    pub fn into_result(self) -> ScrapeResult {
        ScrapeResult::success(self.title, self.content, self.summary, self.needs_js_rendering)
    }
}

/// Extract title and main text from `html` fetched from `url`.
///
/// Fails with a typed error when the cleaned text is too short or reads like
/// leaked script output.
pub fn extract(html: &str, url: &str) -> Result<ExtractedPage, ExtractionError> {
    let mut doc = Html::parse_document(html);

    let title = extract_title(&doc, url);
    let needs_js_rendering = js_detect::needs_js_rendering(&doc, html);
    let payload_text = if needs_js_rendering && js_detect::has_streaming_payload(html) {
        stream_payload::extract_streaming_text(html)
    } else {
        None
    };

    main_content::strip_non_content(&mut doc);
    let dom_text = main_content::main_text(&doc);

    let raw = match payload_text {
        Some(payload) if payload.chars().count() > dom_text.chars().count() => {
            debug!(url, chars = payload.chars().count(), "Using streamed payload text");
            payload
        }
        _ => dom_text,
    };

    let cleaned = text::clean_text(&raw);
    quality::check(&cleaned)?;

    let content = text::truncate_chars(&cleaned, MAX_CONTENT_CHARS);
    let summary = text::truncate_chars(&content, SUMMARY_CHARS);

    Ok(ExtractedPage {
        title,
        content,
        summary,
        needs_js_rendering,
    })
}

fn extract_title(doc: &Html, url: &str) -> String {
    let og = doc
        .select(&OG_TITLE_SELECTOR)
        .filter_map(|el| el.value().attr("content"))
        .map(text::collapse_whitespace)
        .find(|t| !t.is_empty());
    let title = || {
        doc.select(&TITLE_SELECTOR)
            .map(|el| text::collapse_whitespace(&el.text().collect::<String>()))
            .find(|t| !t.is_empty())
    };
    let h1 = || {
        doc.select(&H1_SELECTOR)
            .map(|el| text::collapse_whitespace(&el.text().collect::<String>()))
            .find(|t| !t.is_empty())
    };

    og.or_else(title)
        .or_else(h1)
        .unwrap_or_else(|| host_of(url))
}

fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title_tags: &str, body: &str) -> String {
        format!("<html><head>{title_tags}</head><body><article>{body}</article></body></html>")
    }

    fn paragraph() -> String {
        "<p>The food shelf on Lake Street doubled its weekend hours after volunteers \
         organized a rotating schedule across three congregations.</p>"
            .repeat(6)
    }

    #[test]
    fn title_prefers_og_then_title_then_h1_then_host() {
        let body = paragraph();
        let og = article(
            r#"<meta property="og:title" content="OG Title"><title>Doc Title</title>"#,
            &body,
        );
        assert_eq!(extract(&og, "https://a.test/x").unwrap().title, "OG Title");

        let doc_title = article("<title> Doc   Title </title>", &body);
        assert_eq!(extract(&doc_title, "https://a.test/x").unwrap().title, "Doc Title");

        let h1 = article("", &format!("<h1>Heading</h1>{body}"));
        assert_eq!(extract(&h1, "https://a.test/x").unwrap().title, "Heading");

        let bare = article("", &body);
        assert_eq!(extract(&bare, "https://a.test/x").unwrap().title, "a.test");
    }

    #[test]
    fn content_is_truncated_and_summarized() {
        let body = paragraph().repeat(40);
        let page = extract(&article("<title>T</title>", &body), "https://a.test").unwrap();
        let chars = page.content.chars().count();
        assert!(chars <= MAX_CONTENT_CHARS + 3 && chars > MAX_CONTENT_CHARS - 5);
        assert!(page.content.ends_with("..."));
        assert!(page.summary.chars().count() <= SUMMARY_CHARS + 3);
        assert!(page.content.starts_with(page.summary.trim_end_matches("...")));
        assert!(!page.needs_js_rendering);
    }

    #[test]
    fn short_page_is_too_short() {
        let err = extract(&article("", "<p>Hi.</p>"), "https://a.test").unwrap_err();
        assert!(matches!(err, ExtractionError::ContentTooShort { .. }));
    }

    #[test]
    fn spa_shell_flags_js_and_fails() {
        let html = r#"<html><head><title>App</title></head><body><div id="root"></div>
                      <script src="/static/js/main.js"></script></body></html>"#;
        let err = extract(html, "https://a.test").unwrap_err();
        assert!(matches!(err, ExtractionError::ContentTooShort { .. }));
    }

    #[test]
    fn ok_page_converts_into_success_result() {
        let page = extract(&article("<title>T</title>", &paragraph()), "https://a.test").unwrap();
        let result = page.clone().into_result();
        assert!(!result.is_failure());
        assert_eq!(result.summary.as_deref(), Some(page.summary.as_str()));
    }
}
