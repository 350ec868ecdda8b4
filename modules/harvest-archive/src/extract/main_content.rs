//! Main-content selection.
//!
//! Junk elements are detached from the parsed tree first. Semantic containers
//! are then tried in priority order; when the best one is too thin, the
//! largest single text block wins; the page body is the last resort.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::text::collapse_whitespace;

/// A semantic container shorter than this loses to the largest text block.
pub const MAIN_CONTENT_MIN_CHARS: usize = 300;

const NON_VISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

static JUNK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "script, style, nav, footer, header, aside, noscript, iframe, svg, template, \
         [aria-hidden='true'], [role='presentation'], [role='none'], [role='navigation'], \
         [class*='sidebar'], [class*='promo'], [class*='advert'], [class~='ad'], \
         [class~='ads'], [class*='cookie'], [class*='newsletter'], [class*='social-share'], \
         [class*='share-buttons'], [id*='sidebar'], [id*='cookie']",
    )
    .expect("BUG: hardcoded junk selector is invalid")
});

static PRIORITY_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "article",
        "main",
        "[role='main']",
        "[itemprop='articleBody']",
        ".article-body",
        ".post-content",
        ".entry-content",
        "#content",
        ".content",
    ]
    .into_iter()
    .map(|s| Selector::parse(s).expect("BUG: hardcoded content selector is invalid"))
    .collect()
});

static BLOCK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p, section, div").expect("BUG: hardcoded block selector is invalid")
});

static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body").expect("BUG: hardcoded CSS selector 'body' is invalid")
});

/// Text a reader would see inside `element`: text nodes outside
/// script/style/noscript/template, whitespace-collapsed.
pub(crate) fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| NON_VISIBLE_TAGS.contains(&e.name()))
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    collapse_whitespace(&out)
}

/// Visible text of the whole `<body>`, or of the root when there is none.
pub(crate) fn body_text(doc: &Html) -> String {
    doc.select(&BODY_SELECTOR)
        .next()
        .map(visible_text)
        .unwrap_or_else(|| visible_text(doc.root_element()))
}

/// Detach every non-content element from the tree. `html` and `body` are
/// never removed even if a junk rule matches them.
pub(crate) fn strip_non_content(doc: &mut Html) {
    let ids: Vec<_> = doc
        .select(&JUNK_SELECTOR)
        .filter(|el| !matches!(el.value().name(), "html" | "body"))
        .map(|el| el.id())
        .collect();

    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Pick the main readable text of an already-stripped document.
pub(crate) fn main_text(doc: &Html) -> String {
    let semantic = PRIORITY_SELECTORS
        .iter()
        .find_map(|sel| {
            doc.select(sel)
                .map(visible_text)
                .filter(|t| !t.is_empty())
                .max_by_key(|t| t.chars().count())
        })
        .unwrap_or_default();

    if semantic.chars().count() >= MAIN_CONTENT_MIN_CHARS {
        return semantic;
    }

    let largest_block = doc
        .select(&BLOCK_SELECTOR)
        .map(visible_text)
        .max_by_key(|t| t.chars().count())
        .unwrap_or_default();

    let best = if largest_block.chars().count() > semantic.chars().count() {
        largest_block
    } else {
        semantic
    };

    if best.chars().count() >= MAIN_CONTENT_MIN_CHARS {
        return best;
    }

    let body = body_text(doc);
    if body.chars().count() > best.chars().count() {
        body
    } else {
        best
    }
}
