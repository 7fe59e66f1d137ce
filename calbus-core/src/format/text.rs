use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

static BLOCK_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li)\s*>").expect("valid block break regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Entities decoded by [`clean_text`]. `&amp;` goes last so `&amp;lt;`
/// decodes once, to `&lt;`.
const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#039;", "'"),
    ("&#39;", "'"),
    ("&#8217;", "'"),
    ("&#8216;", "'"),
    ("&rsquo;", "'"),
    ("&lsquo;", "'"),
    ("&#8220;", "\""),
    ("&#8221;", "\""),
    ("&rdquo;", "\""),
    ("&ldquo;", "\""),
    ("&#8211;", "-"),
    ("&#8212;", "-"),
    ("&ndash;", "-"),
    ("&mdash;", "-"),
    ("&amp;", "&"),
];

/// Reduce rich event text to plain single-line ASCII for display topics.
///
/// Strips HTML tags, decodes a fixed set of entities, folds diacritics to
/// their base letters, drops any remaining non-ASCII and collapses
/// whitespace.
pub fn clean_text(text: &str) -> String {
    let text = BLOCK_BREAK_RE.replace_all(text, " ");
    let text = TAG_RE.replace_all(&text, "");

    let mut decoded = text.into_owned();
    for (entity, replacement) in ENTITIES {
        if decoded.contains(entity) {
            decoded = decoded.replace(entity, replacement);
        }
    }

    let folded: String = decoded
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .filter(char::is_ascii)
        .collect();

    WHITESPACE_RE.replace_all(&folded, " ").trim().to_string()
}

/// At most `limit` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
