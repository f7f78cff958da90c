// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Cleans a raw text field and splits it into word tokens
// before vocabulary lookup.
//
// Titles in the corpus are scraped product pages, so they
// may still carry markup:
//   - inline <script> / <style> blocks
//   - HTML comments
//   - tags and &nbsp; entities
//
// Cleaning steps (applied in order):
//   1. Remove script/style blocks, then comments, then tags
//   2. Lower-case
//   3. Map every character outside [a-z0-9':#,$-] to a space
//   4. Split on whitespace and on the word-splitting
//      punctuation set
//   5. Drop tokens made only of punctuation
//
// The result is deterministic: the same input always gives
// the same token list.
//
// Reference: Rust Book §8 (Strings in Rust)
//            Rust Book §13 (Iterators)

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_OR_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script.*?>.*?</script>|<style.*?>.*?</style>").unwrap()
});
static HTML_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->\n?").unwrap());
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<.*?>").unwrap());

/// Characters that separate words in addition to whitespace.
const WORD_SPLIT: &[char] = &[
    '.', ',', '!', '?', '"', '\'', ';', '<', '=', '>', '@', '#', ')', '(',
];

/// Characters that survive normalisation besides [a-z0-9].
const KEPT_SYMBOLS: &str = "':#,$-";

#[derive(Debug, Clone, Copy)]
pub struct Preprocessor;

impl Preprocessor {
    /// Create a new Preprocessor instance
    pub fn new() -> Self {
        Self
    }

    /// Remove HTML markup and collapse whitespace.
    pub fn clean_html(&self, html: &str) -> String {
        // Comments must go before tags: a comment may contain '>'
        let cleaned = SCRIPT_OR_STYLE.replace_all(html.trim(), "");
        let cleaned = HTML_COMMENT.replace_all(&cleaned, "");
        let cleaned = HTML_TAG.replace_all(&cleaned, " ");
        let cleaned = cleaned.replace("&nbsp;", " ");

        collapse_spaces(&cleaned)
    }

    /// Lower-case and replace everything outside the kept
    /// alphabet with a single space.
    pub fn normalize(&self, text: &str) -> String {
        let mapped: String = text
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_lowercase() || c.is_ascii_digit() || KEPT_SYMBOLS.contains(c) {
                    c
                } else {
                    ' '
                }
            })
            .collect();

        collapse_spaces(&mapped)
    }

    /// Full cleaning + word splitting.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = self.normalize(&self.clean_html(text));

        normalized
            .split(|c: char| c.is_whitespace() || WORD_SPLIT.contains(&c))
            .filter(|w| w.chars().any(|c| c.is_ascii_alphanumeric()))
            .map(str::to_string)
            .collect()
    }
}

/// Implement Default so Preprocessor can be created with Preprocessor::default()
impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse whitespace runs into one space and trim the ends.
fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
