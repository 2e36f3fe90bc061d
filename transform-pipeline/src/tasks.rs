use std::sync::Arc;

use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::processing_task::{NewProcessingTask, ProcessingTask, TaskStatus},
    },
};
use tracing::{info, instrument, warn};

use crate::{
    dispatch::BackgroundDispatcher,
    pipeline::{ProcessFileRequest, TransformPipeline},
};

/// Inserts the task as `processing` and hands its files to the dispatcher.
///
/// Returns as soon as the task row exists; pipeline outcomes never reach the caller.
#[instrument(skip_all, fields(task_name = %input.name))]
pub async fn submit_task(
    db: &SurrealDbClient,
    pipeline: Arc<TransformPipeline>,
    dispatcher: &BackgroundDispatcher,
    input: NewProcessingTask,
) -> Result<ProcessingTask, AppError> {
    let task = ProcessingTask::create_and_add_to_db(input, db).await?;
    info!(task_id = %task.id, file_count = task.file_names.len(), "processing task created");

    let job_task = task.clone();
    dispatcher.run_detached(format!("processing-task:{}", task.id), async move {
        run_task_files(&pipeline, &job_task).await
    });

    Ok(task)
}

/// Runs every file of `task` through the pipeline, one after another.
///
/// Only touches the task status when the pipeline is configured to finalize it.
pub async fn run_task_files(
    pipeline: &TransformPipeline,
    task: &ProcessingTask,
) -> Result<(), AppError> {
    let mut failed_files = 0_usize;
    for file in &task.file_names {
        let envelope = pipeline
            .process_file(ProcessFileRequest::for_task(task, &file.name))
            .await;
        if envelope.is_ok() {
            info!(
                task_id = %task.id,
                file_name = %file.name,
                object_name = %envelope.data.object_name,
                object_count = envelope.data.object_count,
                "file processed"
            );
        } else {
            failed_files = failed_files.saturating_add(1);
            warn!(
                task_id = %task.id,
                file_name = %file.name,
                status = envelope.status,
                message = %envelope.message,
                "file processing failed"
            );
        }
    }

    // TODO: finalize by default once the task list UI handles terminal statuses.
    if pipeline.config().finalize_task_status {
        let status = if failed_files == 0 {
            TaskStatus::Succeeded
        } else {
            TaskStatus::Failed
        };
        ProcessingTask::update_status(&task.id, status, pipeline.db()).await?;
    }

    Ok(())
}
