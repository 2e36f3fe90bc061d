use std::sync::OnceLock;

use common::storage::types::stage::StageKind;
use regex::Regex;

use super::{cached_regex, replace_matches, StageFailure, StageOutput, TextTransform};

/// C0 and C1 control ranges plus the soft hyphen. Tabs and line breaks fall inside C0.
const INVISIBLE_PATTERN: &str = r"[\x00-\x1F\x7F-\x9F\xAD]";

static INVISIBLE: OnceLock<Result<Regex, String>> = OnceLock::new();

pub struct RemoveInvisibleCharacters;

impl TextTransform for RemoveInvisibleCharacters {
    fn kind(&self) -> StageKind {
        StageKind::RemoveInvisibleCharacters
    }

    fn apply(&self, text: &str) -> Result<StageOutput, StageFailure> {
        let regex = cached_regex(&INVISIBLE, self.kind(), INVISIBLE_PATTERN)?;
        Ok(replace_matches(regex, text, ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_control_characters_and_counts_them() {
        let output = RemoveInvisibleCharacters
            .apply("a\u{000b}b\r\nc\td\u{0085}e\u{00ad}f")
            .expect("runs");
        assert_eq!(output.text, "abcdef");
        assert_eq!(output.match_count, 6);
    }

    #[test]
    fn second_pass_finds_nothing() {
        let once = RemoveInvisibleCharacters
            .apply("line one\nline two\u{001c}\u{007f}")
            .expect("first pass");
        let twice = RemoveInvisibleCharacters
            .apply(&once.text)
            .expect("second pass");
        assert_eq!(twice.match_count, 0);
        assert_eq!(twice.text, once.text);
    }

    #[test]
    fn keeps_printable_unicode() {
        let input = "“一户一表、水表出户”是指 café";
        let output = RemoveInvisibleCharacters.apply(input).expect("runs");
        assert!(!output.changed());
        assert_eq!(output.text, input);
    }
}
