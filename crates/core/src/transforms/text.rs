//! Plain-text normalization transforms.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static SPECIAL_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new("[^A-Za-z0-9]+").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\r\n|\r|\n)").expect("valid regex"));

/// Characters allowed through `clean_value` besides alphanumerics.
const CLEAN_VALUE_ALLOWED: &str = "-._~:/?#@!$&'()*+,=; ";

/// Replaces every maximal run of characters outside `[A-Za-z0-9]` with a
/// single space. Empty input yields the empty string.
pub fn special_characters(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    SPECIAL_RUNS.replace_all(value, " ").into_owned()
}

/// Sorts whitespace-separated tokens case-insensitively (stable for ties)
/// and rejoins them with single spaces.
pub fn alphabetical(value: &str) -> String {
    let mut parts: Vec<&str> = value.split_whitespace().collect();
    parts.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
    parts.join(" ")
}

/// Lowercases the value. Empty input yields the empty string.
pub fn lower_case(value: &str) -> String {
    value.to_lowercase()
}

/// Cleans a value for safe embedding in delimited exports and URLs.
///
/// The steps run in a fixed order: strip all whitespace, double quotes to
/// single quotes, `|` to `;`, newline runs to a single space, backslashes
/// to forward slashes, then drop anything outside the allow-list of
/// alphanumerics (Unicode, covering accented Latin and Greek),
/// `-._~:/?#@!$&'()*+,=;` and space.
pub fn clean_value(value: &str) -> String {
    let out = WHITESPACE.replace_all(value, "").into_owned();
    let out = out.replace('"', "'");
    let out = out.replace('|', ";");
    let out = NEWLINES.replace_all(&out, " ").into_owned();
    let out = out.replace('\\', "/");
    out.chars()
        .filter(|c| c.is_alphanumeric() || CLEAN_VALUE_ALLOWED.contains(*c))
        .collect()
}
