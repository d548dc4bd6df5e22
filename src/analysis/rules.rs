//! Extraction rules
//!
//! A rule pairs a pattern with an optional transform applied to the matched
//! text. Rule sets for each document type are compiled once and shared.

use regex::Regex;
use std::sync::LazyLock;

/// Normalization applied to a matched substring
pub type Transform = fn(&str) -> String;

/// Shape check a candidate must pass before it is accepted
pub type Accept = fn(&str) -> bool;

/// A single pattern rule for one field
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    /// Pattern searched in the normalized text. When it has a first capture
    /// group, the group is the matched value, otherwise the whole match.
    pub pattern: Regex,
    /// Optional normalization of the matched value
    pub transform: Option<Transform>,
    /// Optional predicate; rejected candidates are skipped and the search
    /// continues to the right
    pub accept: Option<Accept>,
}

impl ExtractionRule {
    fn new(pattern: &Regex) -> Self {
        Self {
            pattern: pattern.clone(),
            transform: None,
            accept: None,
        }
    }

    fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    fn with_accept(mut self, accept: Accept) -> Self {
        self.accept = Some(accept);
        self
    }

    /// Find the leftmost acceptable match and return its transformed value
    pub fn apply(&self, text: &str) -> Option<String> {
        let mut start = 0;
        while start <= text.len() {
            let caps = self.pattern.captures_at(text, start)?;
            let Some(found) = caps.get(1).or_else(|| caps.get(0)) else {
                return None;
            };

            if self.accept.map_or(true, |accept| accept(found.as_str())) {
                let value = match self.transform {
                    Some(transform) => transform(found.as_str()),
                    None => found.as_str().to_string(),
                };
                return Some(value);
            }

            // Resume at the end of the value so a trailing delimiter can
            // lead the next candidate
            let next = if found.end() > start { found.end() } else { start + 1 };
            start = next;
            while start < text.len() && !text.is_char_boundary(start) {
                start += 1;
            }
        }
        None
    }
}

// Delimiters are matched explicitly instead of with \b so that Hangul text
// glued to a number does not hide it.

static CARD_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)((?:\d{4}[ -]?){3}\d{4})(?:\D|$)").unwrap()
});

static CARD_EXPIRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)((?:0[1-9]|1[0-2])/\d{2})(?:\D|$)").unwrap());

static LICENSE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d-])(\d{2}-\d{2}-\d{6}-\d{2})(?:[^\d-]|$)").unwrap()
});

// A trailing hyphen is allowed so "990101-1******" still yields its prefix
static SIX_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\d.\-])(\d{6})(?:[^\d.]|$)").unwrap());

static DOTTED_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{4}\.\d{2}\.\d{2})(?:\D|$)").unwrap());

static DAY_31_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{4}\.\d{2}\.31)(?:\D|$)").unwrap());

// Lowercase letters are word characters too, so a serial is never cut out of
// a mixed-case word
static SERIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9])([A-Z0-9]{6})(?:[^A-Za-z0-9]|$)").unwrap()
});

/// Strip separators and regroup digits in blocks of four
pub fn group_card_digits(matched: &str) -> String {
    let digits: Vec<char> = matched.chars().filter(|c| c.is_ascii_digit()).collect();
    digits
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Serials carry at least one letter, which keeps plain six-digit dates out
fn has_uppercase_letter(candidate: &str) -> bool {
    candidate.chars().any(|c| c.is_ascii_uppercase())
}

pub fn card_number_rules() -> Vec<ExtractionRule> {
    vec![ExtractionRule::new(&CARD_NUMBER).with_transform(group_card_digits)]
}

pub fn card_expiry_rules() -> Vec<ExtractionRule> {
    vec![ExtractionRule::new(&CARD_EXPIRY)]
}

pub fn license_number_rules() -> Vec<ExtractionRule> {
    vec![ExtractionRule::new(&LICENSE_NUMBER)]
}

/// Shared by the birth date and resident-number prefix fields
pub fn six_digit_rules() -> Vec<ExtractionRule> {
    vec![ExtractionRule::new(&SIX_DIGITS)]
}

pub fn issue_date_rules() -> Vec<ExtractionRule> {
    vec![ExtractionRule::new(&DOTTED_DATE)]
}

// TODO: confirm with the licensing domain owner that renewal periods always
// end on the 31st before widening this to month-end dates.
pub fn renewal_expiry_rules() -> Vec<ExtractionRule> {
    vec![ExtractionRule::new(&DAY_31_DATE)]
}

// An all-digit six-character token is deliberately not read as a serial: it is
// indistinguishable from the birth date and resident-number prefix. Revisit
// together with the day-31 rule above if all-digit serials exist.
pub fn serial_rules() -> Vec<ExtractionRule> {
    vec![ExtractionRule::new(&SERIAL).with_accept(has_uppercase_letter)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(rules: &[ExtractionRule], text: &str) -> Option<String> {
        rules.iter().find_map(|rule| rule.apply(text))
    }

    #[test]
    fn test_card_number_with_separators() {
        let rules = card_number_rules();
        assert_eq!(
            first(&rules, "VISA 1234-5678-9012-3456 KIM"),
            Some("1234 5678 9012 3456".to_string())
        );
        assert_eq!(
            first(&rules, "1234567890123456"),
            Some("1234 5678 9012 3456".to_string())
        );
    }

    #[test]
    fn test_card_number_rejects_longer_runs() {
        let rules = card_number_rules();
        assert_eq!(first(&rules, "12345678901234567"), None);
        assert_eq!(first(&rules, "1234 5678 9012"), None);
    }

    #[test]
    fn test_expiry_month_range() {
        let rules = card_expiry_rules();
        assert_eq!(first(&rules, "VALID THRU 05/27"), Some("05/27".to_string()));
        assert_eq!(first(&rules, "13/27"), None);
        assert_eq!(first(&rules, "00/27"), None);
        assert_eq!(first(&rules, "12/25"), Some("12/25".to_string()));
    }

    #[test]
    fn test_six_digits_skip_license_segments_and_dates() {
        let rules = six_digit_rules();
        assert_eq!(first(&rules, "12-34-567890-12"), None);
        assert_eq!(first(&rules, "2020.01.15"), None);
        assert_eq!(
            first(&rules, "12-34-567890-12 990101-1******"),
            Some("990101".to_string())
        );
    }

    #[test]
    fn test_six_digits_next_to_hangul() {
        let rules = six_digit_rules();
        assert_eq!(first(&rules, "생년월일990101"), Some("990101".to_string()));
    }

    #[test]
    fn test_renewal_requires_day_31() {
        let rules = renewal_expiry_rules();
        assert_eq!(first(&rules, "2029.12.30"), None);
        assert_eq!(
            first(&rules, "2029.01.01~2029.12.31"),
            Some("2029.12.31".to_string())
        );
    }

    #[test]
    fn test_serial_skips_all_digit_candidates() {
        let rules = serial_rules();
        assert_eq!(first(&rules, "990101 A1B2C3"), Some("A1B2C3".to_string()));
        assert_eq!(first(&rules, "990101"), None);
        assert_eq!(first(&rules, "ABCDEFG"), None);
    }

    #[test]
    fn test_serial_not_cut_from_mixed_case_words() {
        let rules = serial_rules();
        assert_eq!(first(&rules, "xA1B2C3"), None);
        assert_eq!(first(&rules, "A1B2C3x"), None);
        assert_eq!(first(&rules, "Serial xA1B2C3 Z9Y8X7"), Some("Z9Y8X7".to_string()));
        assert_eq!(first(&rules, "번호A1B2C3"), Some("A1B2C3".to_string()));
    }

    #[test]
    fn test_serial_all_digits_never_match() {
        assert_eq!(first(&serial_rules(), "123456 654321"), None);
    }

    #[test]
    fn test_group_card_digits() {
        assert_eq!(group_card_digits("1234-5678 90123456"), "1234 5678 9012 3456");
    }
}
