use common::storage::types::stage::StageKind;

use super::{StageFailure, StageOutput, TextTransform};

/// Unicode space variants rewritten to an ASCII space.
const SPACE_VARIANTS: [char; 21] = [
    '\u{00A0}', '\u{1680}', '\u{2000}', '\u{2001}', '\u{2002}', '\u{2003}', '\u{2004}',
    '\u{2005}', '\u{2006}', '\u{2007}', '\u{2008}', '\u{2009}', '\u{200A}', '\u{200B}',
    '\u{200C}', '\u{200D}', '\u{2060}', '\u{202F}', '\u{205F}', '\u{3000}', '\u{FEFF}',
];

pub struct SpaceStandardization;

impl TextTransform for SpaceStandardization {
    fn kind(&self) -> StageKind {
        StageKind::SpaceStandardization
    }

    fn apply(&self, text: &str) -> Result<StageOutput, StageFailure> {
        let match_count = text.chars().filter(|c| SPACE_VARIANTS.contains(c)).count();
        if match_count == 0 {
            return Ok(StageOutput::unchanged(text));
        }

        let text = text
            .chars()
            .map(|c| if SPACE_VARIANTS.contains(&c) { ' ' } else { c })
            .collect();

        Ok(StageOutput { match_count, text })
    }
}
