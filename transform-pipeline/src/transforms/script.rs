use common::storage::types::stage::StageKind;
use zhconv::{zhconv, Variant};

use super::{StageFailure, StageOutput, TextTransform};

pub struct TraditionalToSimplified;

impl TextTransform for TraditionalToSimplified {
    fn kind(&self) -> StageKind {
        StageKind::TraditionalToSimplified
    }

    fn apply(&self, text: &str) -> Result<StageOutput, StageFailure> {
        let converted = zhconv(text, Variant::ZhHans);
        if converted == text {
            return Ok(StageOutput::unchanged(text));
        }

        // Conversions are mostly one-to-one; count positional differences plus any length drift.
        let differing = text
            .chars()
            .zip(converted.chars())
            .filter(|(before, after)| before != after)
            .count();
        let drift = text.chars().count().abs_diff(converted.chars().count());

        Ok(StageOutput {
            match_count: differing.saturating_add(drift).max(1),
            text: converted,
        })
    }
}
