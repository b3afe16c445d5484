// Plain-text derivations of post HTML: reading time and excerpt.

use std::sync::LazyLock;

use regex::Regex;

const WORDS_PER_MINUTE: usize = 200;

/// Plain-text length above which an auto-excerpt is truncated.
pub const EXCERPT_LIMIT: usize = 300;

/// Characters kept before the ellipsis when truncating.
const EXCERPT_KEEP: usize = EXCERPT_LIMIT - ELLIPSIS.len();

const ELLIPSIS: &str = "...";

// expect() is fine: the pattern is a literal.
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is a valid literal"));

/// Strip every `<...>` tag. Entities and whitespace are left as is.
pub fn plain_text(html: &str) -> String {
    TAG.replace_all(html, "").into_owned()
}

/// Minutes needed to read `plain`, never less than one.
pub fn reading_time(plain: &str) -> u32 {
    let words = plain.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// The full text when it fits in [`EXCERPT_LIMIT`] characters, otherwise
/// the first 297 characters followed by `...`.
pub fn auto_excerpt(plain: &str) -> String {
    if plain.chars().count() <= EXCERPT_LIMIT {
        return plain.to_string();
    }
    let mut excerpt: String = plain.chars().take(EXCERPT_KEEP).collect();
    excerpt.push_str(ELLIPSIS);
    excerpt
}
