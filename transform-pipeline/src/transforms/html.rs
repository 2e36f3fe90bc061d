use std::sync::OnceLock;

use common::storage::types::stage::StageKind;
use regex::Regex;
use scraper::Html;

use super::{cached_regex, StageFailure, StageOutput, TextTransform};

const TAG_PATTERN: &str = r"<[^>]+>";

static TAG: OnceLock<Result<Regex, String>> = OnceLock::new();

/// List markup turns into `*` bullets on their own line before the markup is dropped.
const LIST_REWRITES: [(&str, &str); 4] = [
    ("<li>", "\n*"),
    ("</li>", ""),
    ("<ol>", "\n*"),
    ("</ol>", ""),
];

pub struct RemoveHtmlTag;

impl TextTransform for RemoveHtmlTag {
    fn kind(&self) -> StageKind {
        StageKind::RemoveHtmlTag
    }

    fn apply(&self, text: &str) -> Result<StageOutput, StageFailure> {
        let tags = cached_regex(&TAG, self.kind(), TAG_PATTERN)?;
        let match_count = tags.find_iter(text).count();
        if match_count == 0 {
            return Ok(StageOutput::unchanged(text));
        }

        let mut rewritten = text.to_string();
        for (from, to) in LIST_REWRITES {
            rewritten = rewritten.replace(from, to);
        }

        let fragment = Html::parse_fragment(&rewritten);
        let stripped: String = fragment.root_element().text().collect();
        if stripped == text {
            return Ok(StageOutput::unchanged(text));
        }

        Ok(StageOutput {
            match_count,
            text: stripped,
        })
    }
}
