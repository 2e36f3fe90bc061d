//! Text-in/text-out transforms applied by the clean and privacy groups.
//!
//! Every transform reports how many matches it rewrote. A transform that
//! reports zero matches hands back its input byte-for-byte.

mod email;
mod emoji;
mod html;
mod invisible;
mod script;
mod whitespace;

use std::{collections::HashMap, sync::OnceLock};

use common::{storage::types::stage::StageKind, utils::config::AppConfig};
use regex::Regex;
use thiserror::Error;

pub use email::RemoveEmail;
pub use emoji::RemoveEmojis;
pub use html::RemoveHtmlTag;
pub use invisible::RemoveInvisibleCharacters;
pub use script::TraditionalToSimplified;
pub use whitespace::SpaceStandardization;

/// Result of one transform invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
    pub match_count: usize,
    pub text: String,
}

impl StageOutput {
    pub fn unchanged(text: &str) -> Self {
        Self {
            match_count: 0,
            text: text.to_string(),
        }
    }

    pub fn changed(&self) -> bool {
        self.match_count > 0
    }
}

/// A transform failed internally. Contained by the orchestrator, never propagated past it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("stage {stage} failed: {message}")]
pub struct StageFailure {
    pub stage: StageKind,
    pub message: String,
}

impl StageFailure {
    pub fn new(stage: StageKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

pub trait TextTransform: Send + Sync {
    fn kind(&self) -> StageKind;

    fn apply(&self, text: &str) -> Result<StageOutput, StageFailure>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSettings {
    pub email_replace_token: String,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            email_replace_token: common::utils::config::default_email_replace_token(),
        }
    }
}

impl From<&AppConfig> for TransformSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            email_replace_token: config.email_replace_token.clone(),
        }
    }
}

/// Every transform the pipeline can run, independent of which ones a layout wires in.
pub struct TransformRegistry {
    transforms: HashMap<StageKind, Box<dyn TextTransform>>,
}

impl TransformRegistry {
    pub fn new(settings: &TransformSettings) -> Self {
        let all: Vec<Box<dyn TextTransform>> = vec![
            Box::new(RemoveInvisibleCharacters),
            Box::new(SpaceStandardization),
            Box::new(TraditionalToSimplified),
            Box::new(RemoveHtmlTag),
            Box::new(RemoveEmojis),
            Box::new(RemoveEmail::new(settings.email_replace_token.clone())),
        ];

        Self {
            transforms: all
                .into_iter()
                .map(|transform| (transform.kind(), transform))
                .collect(),
        }
    }

    /// Adds `transform`, replacing any transform registered for the same stage.
    pub fn register(&mut self, transform: Box<dyn TextTransform>) {
        self.transforms.insert(transform.kind(), transform);
    }

    pub fn get(&self, kind: StageKind) -> Option<&dyn TextTransform> {
        self.transforms.get(&kind).map(AsRef::as_ref)
    }

    pub fn contains(&self, kind: StageKind) -> bool {
        self.transforms.contains_key(&kind)
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new(&TransformSettings::default())
    }
}

/// Compiles `pattern` once per call site. Compilation errors surface as a `StageFailure`.
pub(crate) fn cached_regex(
    cell: &'static OnceLock<Result<Regex, String>>,
    stage: StageKind,
    pattern: &str,
) -> Result<&'static Regex, StageFailure> {
    match cell.get_or_init(|| Regex::new(pattern).map_err(|e| e.to_string())) {
        Ok(regex) => Ok(regex),
        Err(err) => Err(StageFailure::new(
            stage,
            format!("failed to compile pattern: {err}"),
        )),
    }
}

/// Counts and removes/replaces every match of `regex`.
pub(crate) fn replace_matches(regex: &Regex, text: &str, replacement: &str) -> StageOutput {
    let match_count = regex.find_iter(text).count();
    if match_count == 0 {
        return StageOutput::unchanged(text);
    }

    StageOutput {
        match_count,
        text: regex
            .replace_all(text, regex::NoExpand(replacement))
            .into_owned(),
    }
}
