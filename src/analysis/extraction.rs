//! Field extraction engine
//!
//! Walks a document's field schema in order and fills each field from the
//! first rule that matches the normalized text. The engine knows nothing
//! about specific document types.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

use crate::document::DocumentType;

/// Value of a single extracted field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Recognized(String),
    /// No rule matched this cycle
    NotRecognized,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Recognized(value) => Some(value),
            FieldValue::NotRecognized => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, FieldValue::Recognized(_))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Recognized(value) => f.write_str(value),
            FieldValue::NotRecognized => f.write_str("(not recognized)"),
        }
    }
}

/// Extracted fields in schema order; every schema field is present
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldMap {
    entries: Vec<(&'static str, FieldValue)>,
}

impl FieldMap {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.entries.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn recognized_count(&self) -> usize {
        self.entries.iter().filter(|(_, v)| v.is_recognized()).count()
    }
}

// Lookup by name, for consumers that render specific fields
#[cfg_attr(not(test), allow(dead_code))]
impl FieldMap {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    /// Recognized value of a field, if any
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, &value.as_str())?;
        }
        map.end()
    }
}

/// Populate the document's schema from normalized text
pub fn extract(normalized_text: &str, document: &DocumentType) -> FieldMap {
    let entries = document
        .fields()
        .iter()
        .map(|field| {
            // first rule with any acceptable match wins; later rules are not tried
            let value = field
                .rules
                .iter()
                .find_map(|rule| rule.apply(normalized_text))
                .map(FieldValue::Recognized)
                .unwrap_or(FieldValue::NotRecognized);
            (field.name, value)
        })
        .collect();

    FieldMap { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::normalize::normalize;
    use crate::analysis::rules::ExtractionRule;
    use crate::document::{fields, DocumentKind, FieldSpec};
    use regex::Regex;

    fn card() -> DocumentType {
        DocumentType::builtin(DocumentKind::Card)
    }

    fn license() -> DocumentType {
        DocumentType::builtin(DocumentKind::License)
    }

    #[test]
    fn test_card_number_without_expiry() {
        let fields = extract("1234 5678 9012 3456", &card());
        assert_eq!(fields.value(fields::CARD_NUMBER), Some("1234 5678 9012 3456"));
        assert_eq!(fields.get(fields::CARD_EXPIRY), Some(&FieldValue::NotRecognized));
    }

    #[test]
    fn test_card_from_multiline_recognition() {
        let raw = "SHINHAN CARD\n1234-5678\n9012-3456\nVALID THRU 08/29\nHONG GILDONG";
        let fields = extract(&normalize(raw), &card());
        assert_eq!(fields.value(fields::CARD_NUMBER), Some("1234 5678 9012 3456"));
        assert_eq!(fields.value(fields::CARD_EXPIRY), Some("08/29"));
    }

    #[test]
    fn test_license_number() {
        let fields = extract("12-34-567890-12", &license());
        assert_eq!(fields.value(fields::LICENSE_NUMBER), Some("12-34-567890-12"));
        assert_eq!(fields.get(fields::BIRTH_DATE), Some(&FieldValue::NotRecognized));
    }

    #[test]
    fn test_six_digits_fill_both_fields() {
        let fields = extract("990101", &license());
        assert_eq!(fields.value(fields::BIRTH_DATE), Some("990101"));
        assert_eq!(fields.value(fields::RESIDENT_NUMBER_PREFIX), Some("990101"));
    }

    #[test]
    fn test_first_six_digit_token_wins() {
        let fields = extract("880202 990101", &license());
        assert_eq!(fields.value(fields::BIRTH_DATE), Some("880202"));
        assert_eq!(fields.value(fields::RESIDENT_NUMBER_PREFIX), Some("880202"));
    }

    #[test]
    fn test_full_license_transcript() {
        let raw = "자동차운전면허증\n1종보통 12-34-567890-12\n홍길동\n990101-1******\n\
                   적성검사기간 2029.01.01~2029.12.31\n2019.05.20\n서울지방경찰청장\nA1B2C3";
        let fields = extract(&normalize(raw), &license());
        assert_eq!(fields.value(fields::LICENSE_NUMBER), Some("12-34-567890-12"));
        assert_eq!(fields.value(fields::BIRTH_DATE), Some("990101"));
        assert_eq!(fields.value(fields::RESIDENT_NUMBER_PREFIX), Some("990101"));
        // leftmost dotted date, independent of the renewal rule
        assert_eq!(fields.value(fields::ISSUE_DATE), Some("2029.01.01"));
        assert_eq!(fields.value(fields::RENEWAL_EXPIRY), Some("2029.12.31"));
        assert_eq!(fields.value(fields::SERIAL), Some("A1B2C3"));
    }

    #[test]
    fn test_day_31_date_feeds_both_date_fields() {
        let fields = extract("2030.03.31", &license());
        assert_eq!(fields.value(fields::ISSUE_DATE), Some("2030.03.31"));
        assert_eq!(fields.value(fields::RENEWAL_EXPIRY), Some("2030.03.31"));
    }

    #[test]
    fn test_every_schema_field_present() {
        for document in [card(), license()] {
            let fields = extract("", &document);
            assert_eq!(fields.len(), document.fields().len());
            assert_eq!(fields.recognized_count(), 0);
            for spec in document.fields() {
                assert_eq!(fields.get(spec.name), Some(&FieldValue::NotRecognized));
            }
        }
    }

    #[test]
    fn test_first_matching_rule_wins_even_if_later_matches_earlier_in_text() {
        let spec = FieldSpec {
            name: "token",
            rules: vec![
                ExtractionRule {
                    pattern: Regex::new(r"B\d").unwrap(),
                    transform: None,
                    accept: None,
                },
                ExtractionRule {
                    pattern: Regex::new(r"A\d").unwrap(),
                    transform: None,
                    accept: None,
                },
            ],
        };
        let document = card().with_fields(vec![spec]);
        let fields = extract("A1 B2", &document);
        assert_eq!(fields.value("token"), Some("B2"));
    }

    #[test]
    fn test_serializes_in_schema_order() {
        let fields = extract("1234 5678 9012 3456", &card());
        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(
            json,
            r#"{"card_number":"1234 5678 9012 3456","card_expiry":null}"#
        );
    }
}
