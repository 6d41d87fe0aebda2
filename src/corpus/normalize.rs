// Text normalizer — turns one raw line into an analyzable document.
//
// Lowercases, drops everything that is not an ASCII letter, digit or
// separator, then trims. The result is what the engines tokenize on.
//
// Separators are the full Unicode whitespace set plus the ASCII information
// separators U+001C..U+001F. A no-break space or an em space between two
// words survives, so the words stay apart.

use std::sync::LazyLock;

use regex_lite::Regex;

// regex-lite's `\s` only covers ASCII whitespace; the rest is spelled out.
static NON_ALPHANUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[^a-z0-9\s\x1C-\x1F\x{85}\x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}]",
    )
    .expect("valid regex")
});

/// Characters that separate words in a normalized document.
pub fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Normalize one line of text.
///
/// Returns `None` when nothing but whitespace is left, so callers can drop
/// the line without inspecting the string again.
pub fn normalize_line(line: &str) -> Option<String> {
    let lowered = line.to_lowercase();
    let stripped = NON_ALPHANUMERIC.replace_all(&lowered, "");
    let trimmed = stripped.trim_matches(is_separator);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
