use std::path::PathBuf;

use common::{storage::types::stage::StageKind, utils::config::AppConfig};

use crate::{
    qa::{chunking::ChunkSettings, GenerationSettings},
    transforms::TransformSettings,
};

/// What to do when a transform fails internally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StageFailurePolicy {
    /// Keep the text from before the failed stage and run the remaining stages.
    #[default]
    ContinueWithPreviousText,
    /// Stop the run and report the failure.
    Abort,
}

/// Transforms run by each group, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineLayout {
    pub clean: Vec<StageKind>,
    pub privacy: Vec<StageKind>,
}

impl PipelineLayout {
    pub fn standard() -> Self {
        Self {
            clean: vec![
                StageKind::RemoveInvisibleCharacters,
                StageKind::SpaceStandardization,
            ],
            privacy: vec![StageKind::RemoveEmail],
        }
    }

    /// Also wires script conversion, HTML stripping and emoji removal into the clean group.
    pub fn extended() -> Self {
        Self {
            clean: vec![
                StageKind::RemoveInvisibleCharacters,
                StageKind::SpaceStandardization,
                StageKind::TraditionalToSimplified,
                StageKind::RemoveHtmlTag,
                StageKind::RemoveEmojis,
            ],
            privacy: vec![StageKind::RemoveEmail],
        }
    }

    pub fn runs(&self, kind: StageKind) -> bool {
        kind == StageKind::QaSplit || self.clean.contains(&kind) || self.privacy.contains(&kind)
    }
}

impl Default for PipelineLayout {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineTuning {
    pub chunking: ChunkSettings,
    pub generation: GenerationSettings,
}

impl Default for PipelineTuning {
    fn default() -> Self {
        Self {
            chunking: ChunkSettings {
                chunk_size: 500,
                chunk_overlap: 50,
            },
            generation: GenerationSettings::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub tuning: PipelineTuning,
    pub layout: PipelineLayout,
    pub failure_policy: StageFailurePolicy,
    pub transforms: TransformSettings,
    pub data_dir: PathBuf,
    /// Move tasks to `succeeded`/`failed` once every file ran.
    pub finalize_task_status: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tuning: PipelineTuning::default(),
            layout: PipelineLayout::default(),
            failure_policy: StageFailurePolicy::default(),
            transforms: TransformSettings::default(),
            data_dir: PathBuf::from("./data"),
            finalize_task_status: false,
        }
    }
}

impl PipelineConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            tuning: PipelineTuning {
                chunking: ChunkSettings {
                    chunk_size: config.knowledge_chunk_size,
                    chunk_overlap: config.knowledge_chunk_overlap,
                },
                generation: GenerationSettings::from(config),
            },
            layout: if config.enable_extended_clean_stages {
                PipelineLayout::extended()
            } else {
                PipelineLayout::standard()
            },
            failure_policy: StageFailurePolicy::default(),
            transforms: TransformSettings::from(config),
            data_dir: PathBuf::from(&config.data_dir),
            finalize_task_status: config.finalize_task_status,
        }
    }
}
