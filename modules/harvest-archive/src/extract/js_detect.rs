// Decides whether a page only becomes readable after client-side scripts run.
// Must run on the unstripped document: the evidence lives in script tags.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::main_content::body_text;

/// SPA root present and less visible text than this means an empty shell.
pub const SPA_MIN_BODY_TEXT: usize = 500;

/// Script markers of frameworks that stream content as script payloads.
pub(crate) const STREAMING_MARKERS: &[&str] = &["self.__next_f"];

static SPA_ROOT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#root, #app, #__next, #__nuxt, [data-reactroot], [ng-app], [ng-version]")
        .expect("BUG: hardcoded SPA root selector is invalid")
});

static NOSCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("noscript").expect("BUG: hardcoded CSS selector 'noscript' is invalid")
});

static JS_REQUIRED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:enable|requires?|turn on|need)\s+(?:to\s+(?:enable|run)\s+)?javascript|javascript\s+(?:is\s+)?(?:required|disabled|must be enabled|to run this app)",
    )
    .expect("valid regex")
});

pub(crate) fn has_streaming_payload(raw_html: &str) -> bool {
    STREAMING_MARKERS.iter().any(|m| raw_html.contains(m))
}

pub(crate) fn needs_js_rendering(doc: &Html, raw_html: &str) -> bool {
    if has_streaming_payload(raw_html) {
        return true;
    }

    if doc.select(&SPA_ROOT_SELECTOR).next().is_some()
        && body_text(doc).chars().count() < SPA_MIN_BODY_TEXT
    {
        return true;
    }

    doc.select(&NOSCRIPT_SELECTOR)
        .any(|el| JS_REQUIRED_RE.is_match(&el.text().collect::<String>()))
}
