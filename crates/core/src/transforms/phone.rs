//! Phone number normalization.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new("[^0-9]").expect("valid regex"));

/// Normalizes a phone number.
///
/// Values that already read as a plain integer (optional leading sign,
/// digits only) are returned unchanged. A leading `+` is replaced with
/// `exit_code_digits` when one is supplied. Everything else has all
/// non-digit characters stripped.
pub fn normalize_phone(value: &str, exit_code_digits: Option<&str>) -> String {
    if is_integer_like(value) {
        return value.to_string();
    }

    let exit_code = exit_code_digits.unwrap_or("");
    if value.starts_with('+') && !exit_code.is_empty() {
        return NON_DIGITS
            .replace_all(&value.replace('+', exit_code), "")
            .into_owned();
    }

    NON_DIGITS.replace_all(value, "").into_owned()
}

fn is_integer_like(value: &str) -> bool {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
