use common::{error::AppError, storage::types::stage::StageKind};
use state_machines::core::GuardError;
use tracing::{debug, info, instrument, warn};

use super::{
    config::StageFailurePolicy,
    context::PipelineContext,
    state::{Cleaned, Exported, Extracted, Generated, Ready, Scrubbed, TransformMachine},
    ExportSummary,
};
use crate::qa::chunking::ChunkSettings;

#[instrument(
    level = "trace",
    skip_all,
    fields(task_id = %ctx.request.task_id, file_name = %ctx.request.file_name)
)]
pub async fn extract(
    machine: TransformMachine<(), Ready>,
    ctx: &mut PipelineContext<'_>,
) -> Result<TransformMachine<(), Extracted>, AppError> {
    let text = ctx.services.extract_text(&ctx.request.file_name).await?;

    info!(
        task_id = %ctx.request.task_id,
        file_name = %ctx.request.file_name,
        text_chars = text.chars().count(),
        "source text extracted"
    );

    ctx.text = Some(text);

    machine
        .extract()
        .map_err(|(_, guard)| map_guard_error("extract", &guard))
}

#[instrument(
    level = "trace",
    skip_all,
    fields(task_id = %ctx.request.task_id, file_name = %ctx.request.file_name)
)]
pub async fn clean(
    machine: TransformMachine<(), Extracted>,
    ctx: &mut PipelineContext<'_>,
) -> Result<TransformMachine<(), Cleaned>, AppError> {
    let config = ctx.pipeline_config;
    run_group(ctx, &config.layout.clean).await?;

    machine
        .clean()
        .map_err(|(_, guard)| map_guard_error("clean", &guard))
}

#[instrument(
    level = "trace",
    skip_all,
    fields(task_id = %ctx.request.task_id, file_name = %ctx.request.file_name)
)]
pub async fn scrub(
    machine: TransformMachine<(), Cleaned>,
    ctx: &mut PipelineContext<'_>,
) -> Result<TransformMachine<(), Scrubbed>, AppError> {
    let config = ctx.pipeline_config;
    run_group(ctx, &config.layout.privacy).await?;

    machine
        .scrub()
        .map_err(|(_, guard)| map_guard_error("scrub", &guard))
}

#[instrument(
    level = "trace",
    skip_all,
    fields(task_id = %ctx.request.task_id, file_name = %ctx.request.file_name)
)]
pub async fn generate(
    machine: TransformMachine<(), Scrubbed>,
    ctx: &mut PipelineContext<'_>,
) -> Result<TransformMachine<(), Generated>, AppError> {
    if ctx.request.enabled_stages.contains(StageKind::QaSplit) {
        let chunking = ChunkSettings::resolve(
            ctx.pipeline_config.tuning.chunking,
            ctx.request.chunk_size,
            ctx.request.chunk_overlap,
        );
        let pairs = ctx.services.generate_qa(ctx.text()?, chunking).await?;
        let stored = ctx.recorder.record_qa_pairs(&pairs).await;

        debug!(
            task_id = %ctx.request.task_id,
            file_name = %ctx.request.file_name,
            pair_count = pairs.len(),
            stored,
            "QA pairs generated"
        );

        ctx.qa_pairs = pairs;
    }

    machine
        .generate()
        .map_err(|(_, guard)| map_guard_error("generate", &guard))
}

#[instrument(
    level = "trace",
    skip_all,
    fields(task_id = %ctx.request.task_id, file_name = %ctx.request.file_name)
)]
pub async fn export(
    machine: TransformMachine<(), Generated>,
    ctx: &mut PipelineContext<'_>,
) -> Result<TransformMachine<(), Exported>, AppError> {
    if ctx.request.enabled_stages.contains(StageKind::QaSplit) {
        let object_name = ctx
            .services
            .export_qa(&ctx.request.file_name, &ctx.qa_pairs)
            .await?;
        ctx.summary = ExportSummary {
            object_name,
            object_count: ctx.qa_pairs.len(),
        };
    }

    machine
        .export()
        .map_err(|(_, guard)| map_guard_error("export", &guard))
}

/// Runs the enabled stages of one group in order. A stage's output only replaces the
/// working text when it changed something.
async fn run_group(ctx: &mut PipelineContext<'_>, group: &[StageKind]) -> Result<(), AppError> {
    let registry = ctx.registry;
    let policy = ctx.pipeline_config.failure_policy;
    let mut text = ctx.take_text()?;

    for &kind in group {
        if !ctx.request.enabled_stages.contains(kind) {
            continue;
        }
        let Some(transform) = registry.get(kind) else {
            warn!(stage = %kind, "no transform registered for enabled stage");
            continue;
        };

        match transform.apply(&text) {
            Ok(output) => {
                debug!(
                    task_id = %ctx.request.task_id,
                    stage = %kind,
                    match_count = output.match_count,
                    "stage applied"
                );
                if output.changed() {
                    if ctx
                        .recorder
                        .record_transform(kind, &text, &output.text, output.match_count)
                        .await
                    {
                        ctx.details_recorded = ctx.details_recorded.saturating_add(1);
                    }
                    text = output.text;
                }
            }
            Err(failure) => match policy {
                StageFailurePolicy::ContinueWithPreviousText => {
                    warn!(
                        task_id = %ctx.request.task_id,
                        stage = %kind,
                        error = %failure,
                        "stage failed; keeping previous text"
                    );
                }
                StageFailurePolicy::Abort => {
                    ctx.text = Some(text);
                    return Err(AppError::Processing(failure.to_string()));
                }
            },
        }
    }

    ctx.text = Some(text);
    Ok(())
}

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::InternalError(format!(
        "invalid transform pipeline transition during {event}: {guard:?}"
    ))
}
