//! Label canonicalization for cross-source joins.
//!
//! Region labels (from the boundary files) and station labels (from
//! uploaded measurement files) are typed by different people with
//! different keyboards. Arabic text in particular shows up either in
//! logical base letters or in pre-shaped presentation forms, with or
//! without tatweel, diacritics and invisible joining controls. The
//! [`normalize`] function folds all of those to one comparable string.
//!
//! Comparison always happens in logical order. [`display_form`] is a
//! separate helper that reorders text for terminals without bidi support
//! and must never feed a comparison.

use serde_json::Value;
use unicode_bidi::{bidi_class, BidiClass, BidiInfo};
use unicode_normalization::UnicodeNormalization;

/// U+0640 ARABIC TATWEEL, a purely typographic elongation.
const TATWEEL: char = '\u{0640}';

/// Returns true if the text contains any strong right-to-left character.
pub fn has_rtl(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(bidi_class(c), BidiClass::R | BidiClass::AL))
}

/// Canonicalize a label so that semantically identical labels compare equal.
///
/// Surrounding whitespace is always trimmed and internal whitespace runs
/// collapse to one space. Text containing right-to-left characters is
/// additionally folded to NFKC (presentation forms become base letters) and
/// stripped of joining controls, bidi marks, tatweel and Arabic diacritics.
///
/// The function is total and idempotent.
pub fn normalize(text: &str) -> String {
    if !has_rtl(text) {
        return collapse_whitespace(text);
    }
    let folded: String = text
        .trim()
        .nfkc()
        .filter(|c| !is_invisible_control(*c) && !is_arabic_mark(*c) && *c != TATWEEL)
        .collect();
    // recompose whatever the filtering left adjacent
    let recomposed: String = folded.nfkc().collect();
    collapse_whitespace(&recomposed)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize an optional label; a missing label stays missing.
pub fn normalize_label(text: Option<&str>) -> Option<String> {
    text.map(normalize)
}

/// Normalize a GeoJSON/CSV property value.
///
/// Strings are normalized, every other value is returned unchanged.
pub fn normalize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(normalize(s)),
        other => other.clone(),
    }
}

/// Reorder logical text into visual (left-to-right display) order.
pub fn display_form(text: &str) -> String {
    if !has_rtl(text) {
        return text.to_string();
    }
    let info = BidiInfo::new(text, None);
    info.paragraphs
        .iter()
        .map(|para| info.reorder_line(para, para.range.clone()).into_owned())
        .collect()
}

fn is_invisible_control(c: char) -> bool {
    matches!(
        c,
        '\u{061C}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2066}'..='\u{2069}'
            | '\u{FEFF}'
    )
}

fn is_arabic_mark(c: char) -> bool {
    matches!(
        c,
        '\u{0610}'..='\u{061A}'
            | '\u{064B}'..='\u{065F}'
            | '\u{0670}'
            | '\u{06D6}'..='\u{06DC}'
            | '\u{06DF}'..='\u{06E8}'
            | '\u{06EA}'..='\u{06ED}'
    )
}
