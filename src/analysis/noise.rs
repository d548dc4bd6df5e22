//! Noise filtering for the license transcript
//!
//! Produces a cleaned, display-only transcript: native-script words and
//! punctuation are dropped so the numeric and Latin tokens stand out.

/// Alphabet treated as noise in the filtered transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeScript {
    /// Korean syllables and jamo
    Hangul,
}

impl NativeScript {
    pub fn contains(self, c: char) -> bool {
        match self {
            NativeScript::Hangul => matches!(
                c,
                '\u{AC00}'..='\u{D7A3}'   // syllables
                    | '\u{1100}'..='\u{11FF}' // jamo
                    | '\u{3130}'..='\u{318F}' // compatibility jamo
                    | '\u{A960}'..='\u{A97F}' // jamo extended-A
                    | '\u{D7B0}'..='\u{D7FF}' // jamo extended-B
            ),
        }
    }
}

fn is_permitted(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-'
}

/// Strip native-script and disallowed characters line by line, dropping
/// lines that end up empty
pub fn filter(raw: &str, script: NativeScript) -> String {
    raw.split(['\n', '\r', ','])
        .map(|line| {
            line.chars()
                .filter(|&c| !script.contains(c))
                .filter(|&c| is_permitted(c))
                .collect::<String>()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_hangul_and_punctuation() {
        assert_eq!(filter("ABC가나다123!!", NativeScript::Hangul), "ABC123");
    }

    #[test]
    fn test_splits_on_newlines_and_commas() {
        let raw = "자동차운전면허증\n12-34-567890-12\n홍길동, 990101-1234567\n2020.01.15";
        assert_eq!(
            filter(raw, NativeScript::Hangul),
            "12-34-567890-12\n990101-1234567\n2020.01.15"
        );
    }

    #[test]
    fn test_drops_empty_lines_keeps_order() {
        let raw = "서울\n\nB2\r\n,,\n!!\nA1";
        assert_eq!(filter(raw, NativeScript::Hangul), "B2\nA1");
    }

    #[test]
    fn test_removes_spaces_within_line() {
        assert_eq!(filter("1종 보통  A1B2C3", NativeScript::Hangul), "1A1B2C3");
    }

    #[test]
    fn test_hangul_ranges() {
        assert!(NativeScript::Hangul.contains('가'));
        assert!(NativeScript::Hangul.contains('ㄱ'));
        assert!(NativeScript::Hangul.contains('\u{1100}'));
        assert!(!NativeScript::Hangul.contains('A'));
        assert!(!NativeScript::Hangul.contains('漢'));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(filter("", NativeScript::Hangul), "");
    }
}
