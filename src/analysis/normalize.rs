//! Text normalization
//!
//! Recognizers return one line per detected text block. Extraction works on a
//! single line so patterns can span the recognizer's line breaks.

/// Collapse line breaks and whitespace runs into single spaces and trim
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
