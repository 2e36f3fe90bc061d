//! Read-side projection of a task into the category tree shown by the task detail view.

use chrono::{DateTime, Utc};
use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{
            processing_task::ProcessingTask,
            qa_pair::QaPair,
            stage::{StageCategory, StageKind, StageSet},
            transform_detail::TransformDetail,
        },
    },
    utils::config::AppConfig,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::pipeline::PipelineLayout;

pub const CATEGORY_STATUS: &str = "succeed";

/// Bounds applied to each stage preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewLimits {
    pub rows_per_file: usize,
    pub max_chars: usize,
}

impl Default for PreviewLimits {
    fn default() -> Self {
        Self {
            rows_per_file: 10,
            max_chars: 2_000,
        }
    }
}

impl From<&AppConfig> for PreviewLimits {
    fn from(config: &AppConfig) -> Self {
        Self {
            rows_per_file: config.preview_rows_per_file,
            max_chars: config.preview_max_chars,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRow {
    pub pre: String,
    pub post: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePreview {
    pub file_name: String,
    pub content: Vec<PreviewRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageNode {
    pub name: StageKind,
    pub enable: bool,
    pub label: String,
    pub description: String,
    pub preview: Vec<FilePreview>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub name: StageCategory,
    pub description: String,
    pub status: String,
    pub children: Vec<StageNode>,
}

/// Task metadata plus the per-category stage tree.
///
/// A missing task yields the default value, whose `id` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetailView {
    pub id: String,
    pub name: String,
    pub status: String,
    pub file_type: String,
    pub pre_data_set_name: String,
    pub pre_data_set_version: String,
    pub post_data_set_name: String,
    pub post_data_set_version: String,
    pub file_num: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub data_process_config_info: Vec<StageKind>,
    pub config: Vec<CategoryNode>,
}

#[instrument(skip(db, limits))]
pub async fn build_task_detail(
    db: &SurrealDbClient,
    task_id: &str,
    limits: PreviewLimits,
) -> Result<TaskDetailView, AppError> {
    let Some(task) = ProcessingTask::get(task_id, db).await? else {
        debug!(task_id, "task not found; returning empty detail");
        return Ok(TaskDetailView::default());
    };

    let enabled = task.enabled_stages();
    let mut config = Vec::new();
    for category in StageCategory::ALL {
        let stages = enabled.enabled_in(category);
        if stages.is_empty() {
            continue;
        }

        let mut children = Vec::with_capacity(stages.len());
        for kind in stages {
            children.push(StageNode {
                name: kind,
                enable: true,
                label: kind.label().to_string(),
                description: kind.description().to_string(),
                preview: stage_preview(db, &task.id, kind, limits).await?,
            });
        }

        config.push(CategoryNode {
            name: category,
            description: category.description().to_string(),
            status: CATEGORY_STATUS.to_string(),
            children,
        });
    }

    Ok(TaskDetailView {
        id: task.id,
        name: task.name,
        status: task.status.as_str().to_string(),
        file_type: task.file_type,
        pre_data_set_name: task.pre_data_set_name,
        pre_data_set_version: task.pre_data_set_version,
        post_data_set_name: task.post_data_set_name,
        post_data_set_version: task.post_data_set_version,
        file_num: task.file_names.len(),
        start_time: Some(task.start_time),
        end_time: task.end_time,
        data_process_config_info: stage_list(&enabled),
        config,
    })
}

async fn stage_preview(
    db: &SurrealDbClient,
    task_id: &str,
    kind: StageKind,
    limits: PreviewLimits,
) -> Result<Vec<FilePreview>, AppError> {
    let mut previews = Vec::new();

    if kind == StageKind::QaSplit {
        for file_name in QaPair::list_file_names(task_id, db).await? {
            let rows = QaPair::top_n_for_file(task_id, &file_name, limits.rows_per_file, db)
                .await?
                .into_iter()
                .map(|pair| PreviewRow {
                    pre: maybe_truncate(pair.question, limits.max_chars),
                    post: maybe_truncate(pair.answer, limits.max_chars),
                })
                .collect();
            previews.push(FilePreview {
                file_name,
                content: rows,
            });
        }
        return Ok(previews);
    }

    for file_name in TransformDetail::list_file_names(task_id, kind, db).await? {
        let rows = TransformDetail::top_n_for_file(task_id, kind, &file_name, limits.rows_per_file, db)
            .await?
            .into_iter()
            .map(|detail| PreviewRow {
                pre: maybe_truncate(detail.pre_content, limits.max_chars),
                post: maybe_truncate(detail.post_content, limits.max_chars),
            })
            .collect();
        previews.push(FilePreview {
            file_name,
            content: rows,
        });
    }
    Ok(previews)
}

fn stage_list(enabled: &StageSet) -> Vec<StageKind> {
    StageKind::ALL
        .into_iter()
        .filter(|kind| enabled.contains(*kind))
        .collect()
}

fn maybe_truncate(value: String, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value;
    }
    value.chars().take(max_chars).collect()
}

/// One entry of the available-stage listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedStage {
    pub name: StageKind,
    pub label: String,
    pub description: String,
    /// Whether the running pipeline layout executes this stage.
    pub in_pipeline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedCategory {
    pub name: StageCategory,
    pub description: String,
    pub children: Vec<SupportedStage>,
}

/// Every stage of the taxonomy grouped by category.
pub fn support_types(layout: &PipelineLayout) -> Vec<SupportedCategory> {
    StageCategory::ALL
        .into_iter()
        .map(|category| SupportedCategory {
            name: category,
            description: category.description().to_string(),
            children: category
                .stages()
                .map(|kind| SupportedStage {
                    name: kind,
                    label: kind.label().to_string(),
                    description: kind.description().to_string(),
                    in_pipeline: layout.runs(kind),
                })
                .collect(),
        })
        .collect()
}
