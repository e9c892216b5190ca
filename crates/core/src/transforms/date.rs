//! Date reformatting.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Target format used when the caller does not supply one.
pub const DEFAULT_DATE_TARGET_FORMAT: &str = "%d/%m/%Y";

/// Known input formats, tried strictly in order. When a value is parseable
/// by more than one format, the earlier entry wins.
enum InputFormat {
    /// Date and time with a UTC offset.
    DateTimeTz(&'static str),
    /// Naive date and time.
    DateTime(&'static str),
    /// Date only.
    Date(&'static str),
}

const INPUT_FORMATS: &[InputFormat] = &[
    InputFormat::DateTimeTz("%Y-%m-%d %H:%M:%S%z"),
    InputFormat::DateTime("%Y-%m-%d %H:%M:%S"),
    InputFormat::DateTime("%m-%d-%y %H:%M:%S"),
    InputFormat::DateTimeTz("%m-%d-%y %H:%M:%S%z"),
    InputFormat::Date("%Y-%m-%d"),
    InputFormat::Date("%d %m-%Y"),
    InputFormat::Date("%Y/%b/%d"),
    InputFormat::Date("%d-%m-%Y"),
    InputFormat::Date("%d-%b-%Y"),
    InputFormat::Date("%d/%m/%Y"),
    InputFormat::Date("%d %b %Y"),
];

/// Reformats a date string to `target_format`.
///
/// Tries each known input format in order; the first successful parse is
/// reformatted and returned. Values that match no format (and empty
/// values) are returned unchanged, as is everything when the target
/// format itself is malformed.
pub fn normalize_date(value: &str, target_format: &str) -> String {
    if value.is_empty() {
        return value.to_string();
    }

    let parsed = INPUT_FORMATS.iter().find_map(|format| parse(value, format));

    match parsed {
        Some(datetime) => reformat(&datetime, target_format).unwrap_or_else(|| value.to_string()),
        None => value.to_string(),
    }
}

fn parse(value: &str, format: &InputFormat) -> Option<NaiveDateTime> {
    match format {
        InputFormat::DateTimeTz(fmt) => DateTime::parse_from_str(value, fmt)
            .ok()
            .map(|dt| dt.naive_local()),
        InputFormat::DateTime(fmt) => NaiveDateTime::parse_from_str(value, fmt).ok(),
        InputFormat::Date(fmt) => NaiveDate::parse_from_str(value, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
    }
}

fn reformat(datetime: &NaiveDateTime, target_format: &str) -> Option<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(target_format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }

    let mut out = String::new();
    write!(out, "{}", datetime.format_with_items(items.into_iter())).ok()?;
    Some(out)
}
