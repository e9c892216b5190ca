//! Column-name sanitization and de-duplication.
//!
//! Produces legal, unique identifiers for a whole header row at once.
//! Three policy versions are supported; v2 is the default used by the
//! pipeline.

use deunicode::deunicode;
use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::translit::{available_languages, transliterate, DEFAULT_TARGET_LANG};

/// Longest identifier emitted, suffixes included.
pub const IDENTIFIER_MAX_LENGTH: usize = 63;

/// Column names reserved by the downstream storage engine.
pub const RESERVED_COLUMN_NAMES: &[&str] = &["tableoid", "xmin", "cmin", "xmax", "cmax", "ctid"];

static UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new("_{2,}").expect("valid regex"));

/// Normalizes a header row under the given policy version.
///
/// The output has the same length as the input, every name is unique
/// within the row, and (for versions 2 and 3) no name exceeds
/// [`IDENTIFIER_MAX_LENGTH`] or collides case-insensitively with the
/// reserved set. Names are processed in row order; a later name never
/// displaces an earlier assignment. Unknown versions pass names through
/// untouched.
pub fn normalize_column_names(column_names: &[String], version: u8) -> Vec<String> {
    let mut assigned: Vec<String> = Vec::with_capacity(column_names.len());

    for candidate in column_names {
        let name = match version {
            1 => {
                let name = if candidate.is_empty() {
                    "untitled_column".to_string()
                } else {
                    candidate.clone()
                };
                let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
                let name = name.to_lowercase();
                let name: String = name
                    .chars()
                    .map(|c| {
                        if c.is_ascii_lowercase() || c.is_ascii_digit() {
                            c
                        } else {
                            '_'
                        }
                    })
                    .collect();
                let name = UNDERSCORE_RUNS.replace_all(&name, "_").into_owned();
                let name = if starts_with_letter_or_underscore(&name) {
                    name
                } else {
                    format!("column_{name}")
                };
                avoid_collisions(&name, &assigned, &[], IDENTIFIER_MAX_LENGTH)
            }
            2 => {
                let name = UNDERSCORE_RUNS
                    .replace_all(&sanitize_name(candidate), "_")
                    .into_owned();
                let name = truncate(&name, IDENTIFIER_MAX_LENGTH);
                avoid_collisions(&name, &assigned, RESERVED_COLUMN_NAMES, IDENTIFIER_MAX_LENGTH)
            }
            3 => {
                let name = sanitize_name(candidate).replace('-', "_");
                let name = truncate(&name, IDENTIFIER_MAX_LENGTH);
                avoid_collisions(&name, &assigned, RESERVED_COLUMN_NAMES, IDENTIFIER_MAX_LENGTH)
            }
            _ => candidate.clone(),
        };
        assigned.push(name);
    }

    assigned
}

/// Transliterates a name to a Latin-compatible form and guards reserved
/// words and disallowed leading characters with an underscore prefix.
fn sanitize_name(column_name: &str) -> String {
    let langs: Vec<String> = available_languages()
        .iter()
        .map(|l| l.to_string())
        .collect();
    let mut name = transliterate(column_name, &langs, DEFAULT_TARGET_LANG);
    if !name.is_ascii() {
        name = deunicode(&name);
    }
    if reserved_or_unsupported(&name) {
        return format!("_{name}");
    }
    name
}

fn reserved_or_unsupported(column_name: &str) -> bool {
    if RESERVED_COLUMN_NAMES.contains(&column_name.to_lowercase().as_str()) {
        return true;
    }
    !starts_with_letter_or_underscore(column_name)
}

fn starts_with_letter_or_underscore(name: &str) -> bool {
    name.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

/// Suffixes `_1`, `_2`, … until the name collides with neither the
/// already-assigned names nor the reserved set, truncating the base so
/// the result stays within `max_length`.
fn avoid_collisions(
    name: &str,
    existing_names: &[String],
    reserved_words: &[&str],
    max_length: usize,
) -> String {
    let mut cnt = 1usize;
    let mut new_name = name.to_string();
    while existing_names.iter().any(|n| n == &new_name)
        || reserved_words.contains(&new_name.to_lowercase().as_str())
    {
        let suffix = format!("_{cnt}");
        new_name = format!("{}{}", truncate(name, max_length - suffix.len()), suffix);
        cnt += 1;
    }
    new_name
}

fn truncate(name: &str, max_chars: usize) -> String {
    name.chars().take(max_chars).collect()
}
