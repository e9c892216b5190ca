//! Field-level normalization transforms.
//!
//! Every function here is total and stateless: one scalar in, one scalar
//! out, no shared state. The pipeline engine decides which columns each
//! transform is applied to.

mod columns;
mod date;
mod phone;
mod text;
mod translit;

pub use columns::{normalize_column_names, IDENTIFIER_MAX_LENGTH, RESERVED_COLUMN_NAMES};
pub use date::{normalize_date, DEFAULT_DATE_TARGET_FORMAT};
pub use phone::normalize_phone;
pub use text::{alphabetical, clean_value, lower_case, special_characters};
pub use translit::{available_languages, transliterate, DEFAULT_TARGET_LANG};
