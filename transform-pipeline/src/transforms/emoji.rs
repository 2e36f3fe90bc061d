use std::sync::OnceLock;

use common::storage::types::stage::StageKind;
use regex::Regex;

use super::{cached_regex, replace_matches, StageFailure, StageOutput, TextTransform};

const EMOJI_PATTERN: &str =
    r"[\p{Extended_Pictographic}\p{Emoji_Modifier}\u{FE0F}\u{20E3}\u{1F1E6}-\u{1F1FF}]";

static EMOJI: OnceLock<Result<Regex, String>> = OnceLock::new();

pub struct RemoveEmojis;

impl TextTransform for RemoveEmojis {
    fn kind(&self) -> StageKind {
        StageKind::RemoveEmojis
    }

    fn apply(&self, text: &str) -> Result<StageOutput, StageFailure> {
        let regex = cached_regex(&EMOJI, self.kind(), EMOJI_PATTERN)?;
        Ok(replace_matches(regex, text, ""))
    }
}
