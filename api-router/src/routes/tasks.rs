use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use common::{
    storage::types::processing_task::{NewProcessingTask, ProcessingTask},
    utils::envelope::Envelope,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use transform_pipeline::{build_task_detail, submit_task, TaskDetailView};

use crate::{api_state::ApiState, error::ApiError};

const DEFAULT_PAGE_SIZE: usize = 10;

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListByPageParams {
    /// Zero-based page number.
    #[serde(default)]
    pub page_index: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub keyword: String,
}

#[derive(Debug, Deserialize)]
pub struct CountParams {
    #[serde(default)]
    pub keyword: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskIdParams {
    pub id: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TaskListItem {
    pub id: String,
    pub name: String,
    pub status: String,
    pub file_type: String,
    pub pre_data_set_name: String,
    pub pre_data_set_version: String,
    pub post_data_set_name: String,
    pub post_data_set_version: String,
    pub file_num: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl From<ProcessingTask> for TaskListItem {
    fn from(task: ProcessingTask) -> Self {
        Self {
            file_num: task.file_names.len(),
            id: task.id,
            name: task.name,
            status: task.status.as_str().to_string(),
            file_type: task.file_type,
            pre_data_set_name: task.pre_data_set_name,
            pre_data_set_version: task.pre_data_set_version,
            post_data_set_name: task.post_data_set_name,
            post_data_set_version: task.post_data_set_version,
            start_time: task.start_time,
            end_time: task.end_time,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CreatedTask {
    pub id: String,
}

pub async fn list_by_page(
    State(state): State<ApiState>,
    Json(params): Json<ListByPageParams>,
) -> Result<Json<Envelope<Vec<TaskListItem>>>, ApiError> {
    let tasks = ProcessingTask::list_by_page(
        &params.keyword,
        params.page_index,
        params.page_size,
        &state.db,
    )
    .await?;

    Ok(Json(Envelope::ok(
        tasks.into_iter().map(TaskListItem::from).collect(),
    )))
}

pub async fn list_by_count(
    State(state): State<ApiState>,
    Json(params): Json<CountParams>,
) -> Result<Json<Envelope<u64>>, ApiError> {
    let total = ProcessingTask::count(&params.keyword, &state.db).await?;

    Ok(Json(Envelope::ok(total)))
}

/// Registers the task and returns immediately; the pipeline runs detached.
pub async fn add(
    State(state): State<ApiState>,
    Json(input): Json<NewProcessingTask>,
) -> Result<Json<Envelope<CreatedTask>>, ApiError> {
    let task = submit_task(
        &state.db,
        state.pipeline.clone(),
        &state.dispatcher,
        input,
    )
    .await?;

    Ok(Json(Envelope::ok(CreatedTask { id: task.id })))
}

pub async fn delete_by_id(
    State(state): State<ApiState>,
    Json(params): Json<TaskIdParams>,
) -> Result<Json<Envelope<serde_json::Value>>, ApiError> {
    let existed = ProcessingTask::delete_with_details(&params.id, &state.db).await?;
    info!(task_id = %params.id, existed, "processing task deleted");

    Ok(Json(Envelope::ok(serde_json::json!({}))))
}

pub async fn info_by_id(
    State(state): State<ApiState>,
    Json(params): Json<TaskIdParams>,
) -> Result<Json<Envelope<TaskDetailView>>, ApiError> {
    let view = build_task_detail(&state.db, &params.id, state.preview_limits).await?;

    Ok(Json(Envelope::ok(view)))
}
