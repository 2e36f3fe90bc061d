use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Every transform the pipeline knows about, whether or not a task enables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    QaSplit,
    RemoveInvisibleCharacters,
    SpaceStandardization,
    TraditionalToSimplified,
    RemoveHtmlTag,
    RemoveEmojis,
    RemoveEmail,
}

/// Display grouping used by the task detail tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum StageCategory {
    ChunkProcessing,
    Clean,
    Privacy,
}

impl StageKind {
    pub const ALL: [StageKind; 7] = [
        StageKind::QaSplit,
        StageKind::RemoveInvisibleCharacters,
        StageKind::SpaceStandardization,
        StageKind::TraditionalToSimplified,
        StageKind::RemoveHtmlTag,
        StageKind::RemoveEmojis,
        StageKind::RemoveEmail,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            StageKind::QaSplit => "qa_split",
            StageKind::RemoveInvisibleCharacters => "remove_invisible_characters",
            StageKind::SpaceStandardization => "space_standardization",
            StageKind::TraditionalToSimplified => "traditional_to_simplified",
            StageKind::RemoveHtmlTag => "remove_html_tag",
            StageKind::RemoveEmojis => "remove_emojis",
            StageKind::RemoveEmail => "remove_email",
        }
    }

    pub const fn category(self) -> StageCategory {
        match self {
            StageKind::QaSplit => StageCategory::ChunkProcessing,
            StageKind::RemoveInvisibleCharacters
            | StageKind::SpaceStandardization
            | StageKind::TraditionalToSimplified
            | StageKind::RemoveHtmlTag
            | StageKind::RemoveEmojis => StageCategory::Clean,
            StageKind::RemoveEmail => StageCategory::Privacy,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            StageKind::QaSplit => "QA split",
            StageKind::RemoveInvisibleCharacters => "Remove invisible characters",
            StageKind::SpaceStandardization => "Standardize spaces",
            StageKind::TraditionalToSimplified => "Traditional to simplified Chinese",
            StageKind::RemoveHtmlTag => "Remove HTML tags",
            StageKind::RemoveEmojis => "Remove emojis",
            StageKind::RemoveEmail => "Remove email",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            StageKind::QaSplit => {
                "Splits the document into chunks and generates question/answer pairs from each chunk."
            }
            StageKind::RemoveInvisibleCharacters => {
                "Removes invisible control characters, such as the 0-32 and 127-160 ranges."
            }
            StageKind::SpaceStandardization => {
                "Converts unicode space variants, for example U+2008, into a regular space."
            }
            StageKind::TraditionalToSimplified => {
                "Converts traditional Chinese characters into simplified Chinese."
            }
            StageKind::RemoveHtmlTag => "Strips HTML markup and keeps the text content.",
            StageKind::RemoveEmojis => "Removes emoji and pictographic symbols.",
            StageKind::RemoveEmail => "Replaces email addresses with a placeholder token.",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("unknown stage type '{s}'")))
    }
}

impl StageCategory {
    pub const ALL: [StageCategory; 3] = [
        StageCategory::ChunkProcessing,
        StageCategory::Clean,
        StageCategory::Privacy,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            StageCategory::ChunkProcessing => "chunk_processing",
            StageCategory::Clean => "clean",
            StageCategory::Privacy => "privacy",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            StageCategory::ChunkProcessing => "Chunk processing",
            StageCategory::Clean => "Abnormal content cleaning",
            StageCategory::Privacy => "Data privacy processing",
        }
    }

    /// Stages belonging to this category, in registry order.
    pub fn stages(self) -> impl Iterator<Item = StageKind> {
        StageKind::ALL
            .into_iter()
            .filter(move |kind| kind.category() == self)
    }
}

/// One entry of a task's enabled-stage list, e.g. `{"type": "qa_split"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfigEntry {
    #[serde(rename = "type")]
    pub kind: StageKind,
}

impl From<StageKind> for StageConfigEntry {
    fn from(kind: StageKind) -> Self {
        Self { kind }
    }
}

/// Enabled stages of a task. Order of the source list is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageSet {
    enabled: HashSet<StageKind>,
}

impl StageSet {
    pub fn from_entries(entries: &[StageConfigEntry]) -> Self {
        Self {
            enabled: entries.iter().map(|entry| entry.kind).collect(),
        }
    }

    pub fn contains(&self, kind: StageKind) -> bool {
        self.enabled.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    /// Enabled stages of `category`, in registry order.
    pub fn enabled_in(&self, category: StageCategory) -> Vec<StageKind> {
        category.stages().filter(|kind| self.contains(*kind)).collect()
    }
}

impl FromIterator<StageKind> for StageSet {
    fn from_iter<I: IntoIterator<Item = StageKind>>(iter: I) -> Self {
        Self {
            enabled: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_entries_deserialize_from_type_field() {
        let entries: Vec<StageConfigEntry> = serde_json::from_str(
            r#"[{"type":"qa_split"},{"type":"remove_invisible_characters"},{"type":"remove_email"},{"type":"qa_split"}]"#,
        )
        .expect("entries parse");

        let set = StageSet::from_entries(&entries);
        assert!(set.contains(StageKind::QaSplit));
        assert!(set.contains(StageKind::RemoveEmail));
        assert!(!set.contains(StageKind::SpaceStandardization));
        assert_eq!(
            set.enabled_in(StageCategory::Clean),
            vec![StageKind::RemoveInvisibleCharacters]
        );
    }

    #[test]
    fn unknown_stage_type_is_rejected() {
        let parsed: Result<Vec<StageConfigEntry>, _> =
            serde_json::from_str(r#"[{"type":"shuffle_words"}]"#);
        assert!(parsed.is_err());
        assert!("shuffle_words".parse::<StageKind>().is_err());
    }

    #[test]
    fn every_stage_has_exactly_one_category() {
        let grouped: usize = StageCategory::ALL
            .into_iter()
            .map(|category| category.stages().count())
            .sum();
        assert_eq!(grouped, StageKind::ALL.len());
        assert_eq!(
            StageCategory::ChunkProcessing.stages().collect::<Vec<_>>(),
            vec![StageKind::QaSplit]
        );
        assert_eq!(StageKind::RemoveEmojis.category(), StageCategory::Clean);
    }

    #[test]
    fn string_names_round_trip_through_from_str() {
        for kind in StageKind::ALL {
            assert_eq!(kind.as_str().parse::<StageKind>().ok(), Some(kind));
            let json = serde_json::to_string(&kind).expect("serialize");
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
