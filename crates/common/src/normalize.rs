//! Title normalization and matching
//!
//! The search API wraps matched substrings in highlight markup. Two shapes
//! occur in practice: element tags (`<em>`, `<mark>`,
//! `<ais-highlight-0000000000>`) and the plain-text Algolia markers
//! `__ais-highlight__ ... __/ais-highlight__`. Both are removed, then the
//! handful of entities the highlighter escapes are decoded.

use once_cell::sync::Lazy;
use regex::Regex;

/// Opening or closing element tag. The name must start with a letter so
/// comparisons like `a < b > c` survive untouched.
static HIGHLIGHT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>").expect("valid highlight tag regex")
});

static HIGHLIGHT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__/?ais-highlight__").expect("valid highlight marker regex"));

/// Remove highlight markup from an API title
pub fn strip_markup(title: &str) -> String {
    let without_markers = HIGHLIGHT_MARKER.replace_all(title, "");
    let without_tags = HIGHLIGHT_TAG.replace_all(&without_markers, "");
    decode_entities(&without_tags)
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    // &amp; last so "&amp;lt;" decodes to "&lt;" and not "<"
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Lower-case, collapse whitespace runs to one space, trim
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalize a highlighted API title: strip markup, then [`normalize_text`]
pub fn normalize_title(highlighted: &str) -> String {
    normalize_text(&strip_markup(highlighted))
}

/// Substring containment in either direction.
///
/// Highlighting and UI truncation can both alter a title, so exact equality
/// is too strict. Operands are expected to be normalized already.
pub fn titles_match(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}
