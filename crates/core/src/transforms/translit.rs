//! Script-to-script transliteration.
//!
//! Languages with a built-in reverse table (currently Greek and Russian)
//! are transliterated table-driven; any other requested source language
//! falls back to a generic script-to-Latin pass.

use deunicode::deunicode;

/// Default generic transliteration target (Latin script).
pub const DEFAULT_TARGET_LANG: &str = "la";

const SUPPORTED_LANGS: &[&str] = &["el", "ru"];

/// Language codes with a built-in reverse-transliteration table.
pub fn available_languages() -> &'static [&'static str] {
    SUPPORTED_LANGS
}

/// Transliterates `value` for each source language in order.
///
/// A language with a built-in table rewrites the current text; an unknown
/// language falls back to a generic script conversion of the original
/// input targeting `fallback_target` (only Latin is supported — other
/// targets leave the value unchanged).
pub fn transliterate(value: &str, source_langs: &[String], fallback_target: &str) -> String {
    let mut text = value.to_string();
    for lang in source_langs {
        match table_for(lang) {
            Some(table) => text = apply_table(&text, table),
            None => text = generic_to_target(value, fallback_target),
        }
    }
    text
}

fn generic_to_target(value: &str, target: &str) -> String {
    match target {
        "la" | "lat" | "latin" => deunicode(value),
        _ => value.to_string(),
    }
}

type TranslitTable = fn(char) -> Option<&'static str>;

fn table_for(lang: &str) -> Option<TranslitTable> {
    match lang {
        "el" => Some(greek),
        "ru" => Some(russian),
        _ => None,
    }
}

fn apply_table(value: &str, table: TranslitTable) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match table(c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    out
}

// Reverse table for Greek. Accented capitals are deliberately absent: the
// source tables only cover the unaccented capitals and accented lowercase
// vowels, and values containing them pass those characters through.
fn greek(c: char) -> Option<&'static str> {
    Some(match c {
        'α' | 'ά' => "a",
        'β' => "v",
        'γ' => "g",
        'δ' => "d",
        'ε' | 'έ' => "e",
        'ζ' => "z",
        'η' | 'ή' => "i",
        'θ' => "th",
        'ι' | 'ί' | 'ϊ' | 'ΐ' => "i",
        'κ' => "k",
        'λ' => "l",
        'μ' => "m",
        'ν' => "n",
        'ξ' => "x",
        'ο' | 'ό' => "o",
        'π' => "p",
        'ρ' => "r",
        'σ' | 'ς' => "s",
        'τ' => "t",
        'υ' | 'ύ' | 'ϋ' | 'ΰ' => "u",
        'φ' => "f",
        'χ' => "ch",
        'ψ' => "ps",
        'ω' | 'ώ' => "o",
        'Α' => "A",
        'Β' => "V",
        'Γ' => "G",
        'Δ' => "D",
        'Ε' => "E",
        'Ζ' => "Z",
        'Η' => "I",
        'Θ' => "Th",
        'Ι' => "I",
        'Κ' => "K",
        'Λ' => "L",
        'Μ' => "M",
        'Ν' => "N",
        'Ξ' => "X",
        'Ο' => "O",
        'Π' => "P",
        'Ρ' => "R",
        'Σ' => "S",
        'Τ' => "T",
        'Υ' => "U",
        'Φ' => "F",
        'Χ' => "Ch",
        'Ψ' => "Ps",
        'Ω' => "O",
        _ => return None,
    })
}

fn russian(c: char) -> Option<&'static str> {
    Some(match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'ё' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "c",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "ju",
        'я' => "ja",
        'А' => "A",
        'Б' => "B",
        'В' => "V",
        'Г' => "G",
        'Д' => "D",
        'Е' | 'Ё' => "E",
        'Ж' => "Zh",
        'З' => "Z",
        'И' => "I",
        'Й' => "J",
        'К' => "K",
        'Л' => "L",
        'М' => "M",
        'Н' => "N",
        'О' => "O",
        'П' => "P",
        'Р' => "R",
        'С' => "S",
        'Т' => "T",
        'У' => "U",
        'Ф' => "F",
        'Х' => "H",
        'Ц' => "C",
        'Ч' => "Ch",
        'Ш' => "Sh",
        'Щ' => "Sch",
        'Ъ' | 'Ь' => "",
        'Ы' => "Y",
        'Э' => "E",
        'Ю' => "Ju",
        'Я' => "Ja",
        _ => return None,
    })
}
