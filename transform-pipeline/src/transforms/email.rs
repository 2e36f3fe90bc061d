use std::sync::OnceLock;

use common::storage::types::stage::StageKind;
use regex::Regex;

use super::{cached_regex, replace_matches, StageFailure, StageOutput, TextTransform};

const EMAIL_PATTERN: &str = r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}";

static EMAIL: OnceLock<Result<Regex, String>> = OnceLock::new();

/// Replaces every email address with `replace_token`.
pub struct RemoveEmail {
    replace_token: String,
}

impl RemoveEmail {
    pub fn new(replace_token: impl Into<String>) -> Self {
        Self {
            replace_token: replace_token.into(),
        }
    }
}

impl Default for RemoveEmail {
    fn default() -> Self {
        Self::new(common::utils::config::default_email_replace_token())
    }
}

impl TextTransform for RemoveEmail {
    fn kind(&self) -> StageKind {
        StageKind::RemoveEmail
    }

    fn apply(&self, text: &str) -> Result<StageOutput, StageFailure> {
        let regex = cached_regex(&EMAIL, self.kind(), EMAIL_PATTERN)?;
        Ok(replace_matches(regex, text, &self.replace_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_every_address() {
        let output = RemoveEmail::default()
            .apply("mail first.last+tag@mail.example.com or x_y%z@corp.io today")
            .expect("runs");
        assert_eq!(output.text, "mail T:EMAIL or T:EMAIL today");
        assert_eq!(output.match_count, 2);

        let regex = Regex::new(EMAIL_PATTERN).expect("pattern compiles");
        assert!(!regex.is_match(&output.text));
    }

    #[test]
    fn address_fragments_are_not_emails() {
        let input = "user@localhost and @handle and name@domain.c";
        let output = RemoveEmail::default().apply(input).expect("runs");
        assert!(!output.changed());
        assert_eq!(output.text, input);
    }

    #[test]
    fn replacement_token_is_literal() {
        let output = RemoveEmail::new("$0")
            .apply("a@b.com")
            .expect("runs");
        assert_eq!(output.text, "$0");
    }
}
