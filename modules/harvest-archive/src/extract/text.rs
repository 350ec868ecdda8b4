// Post-processing over plain text: whitespace, boilerplate, truncation.

use std::sync::LazyLock;

use regex::Regex;

pub const ELLIPSIS: &str = "...";

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\u{00A0}\u{200B}]+").expect("valid regex"));

static BOILERPLATE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:we use cookies|this (?:web)?site uses cookies)[^.!?]*[.!?]?",
        r"(?i)\baccept (?:all )?cookies\b[.!]?",
        r"(?i)\b(?:subscribe to|sign up for) our newsletter[^.!?]*[.!?]?",
        r"(?i)\bfollow us on [^.!?]*[.!?]?",
        r"(?i)\bshare (?:this|on) (?:article|story|post|page|facebook|twitter|x|linkedin|email)\b[.!]?",
        r"(?i)\b(?:read|see) our (?:privacy|cookie) policy[^.!?]*[.!?]?",
        r"(?i)(?:©|\(c\)|\bcopyright\b)[^©]{0,80}?\ball rights reserved\b\.?",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Collapse runs of whitespace (including non-breaking and zero-width
/// spaces) into single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Remove cookie/newsletter/social-share/legal notices.
pub fn strip_boilerplate(text: &str) -> String {
    let mut out = text.to_string();
    for re in BOILERPLATE_RES.iter() {
        out = re.replace_all(&out, " ").into_owned();
    }
    out
}

/// Whitespace collapse and boilerplate removal, in that order and once more
/// for the gaps boilerplate removal leaves behind.
pub fn clean_text(text: &str) -> String {
    collapse_whitespace(&strip_boilerplate(&collapse_whitespace(text)))
}

/// Cut `text` to at most `max_chars` characters, appending `...` when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => {
            let mut out = text[..byte_idx].trim_end().to_string();
            out.push_str(ELLIPSIS);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_nbsp_and_newlines() {
        assert_eq!(collapse_whitespace("  a\u{00A0}\u{00A0}b\n\n\tc  "), "a b c");
    }

    #[test]
    fn strips_cookie_and_newsletter_notices() {
        let text = "Real sentence about rivers. We use cookies to improve your experience. \
                    Subscribe to our newsletter for weekly updates. Another real sentence.";
        let cleaned = clean_text(text);
        assert_eq!(cleaned, "Real sentence about rivers. Another real sentence.");
    }

    #[test]
    fn strips_copyright_line() {
        let cleaned = clean_text("Body text here. © 2024 Example Media. All rights reserved.");
        assert_eq!(cleaned, "Body text here.");

        let cleaned = clean_text("Copyright 2019-2024 City News, Inc. All Rights Reserved. Tips welcome.");
        assert_eq!(cleaned, "Tips welcome.");
    }

    #[test]
    fn rights_reserved_without_notice_lead_in_is_kept() {
        let text = "The county clerk keeps the deeds, and all rights reserved to owners stay on file.";
        assert_eq!(clean_text(text), text);
    }

    #[test]
    fn keeps_ordinary_mentions_of_sharing() {
        let cleaned = clean_text("Neighbors share tools and meals every weekend.");
        assert_eq!(cleaned, "Neighbors share tools and meals every weekend.");
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo...");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exact", 5), "exact");
    }
}
