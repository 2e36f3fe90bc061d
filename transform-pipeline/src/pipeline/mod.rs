mod config;
mod context;
mod recorder;
mod services;
mod stages;
mod state;

pub use config::{PipelineConfig, PipelineLayout, PipelineTuning, StageFailurePolicy};
#[allow(clippy::module_name_repetitions)]
pub use services::{DefaultPipelineServices, PipelineServices};

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_openai::{config::OpenAIConfig, Client};
use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{processing_task::ProcessingTask, stage::StageSet},
    },
    utils::{config::AppConfig, envelope::Envelope},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::transforms::TransformRegistry;

use self::{
    context::PipelineContext,
    recorder::DetailRecorder,
    stages::{clean, export, extract, generate, scrub},
    state::ready,
};

/// One source file of a task, with the task's enabled stages.
#[derive(Debug, Clone)]
pub struct ProcessFileRequest {
    pub task_id: String,
    pub file_name: String,
    pub enabled_stages: StageSet,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
}

impl ProcessFileRequest {
    pub fn for_task(task: &ProcessingTask, file_name: &str) -> Self {
        Self {
            task_id: task.id.clone(),
            file_name: file_name.to_string(),
            enabled_stages: task.enabled_stages(),
            chunk_size: None,
            chunk_overlap: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub object_name: String,
    pub object_count: usize,
}

pub struct TransformPipeline {
    db: Arc<SurrealDbClient>,
    pipeline_config: PipelineConfig,
    services: Arc<dyn PipelineServices>,
    registry: TransformRegistry,
}

impl TransformPipeline {
    pub fn new(
        db: Arc<SurrealDbClient>,
        openai_client: Arc<Client<OpenAIConfig>>,
        config: &AppConfig,
    ) -> Result<Self, AppError> {
        Self::new_with_config(
            db,
            openai_client,
            config,
            PipelineConfig::from_app_config(config),
        )
    }

    pub fn new_with_config(
        db: Arc<SurrealDbClient>,
        openai_client: Arc<Client<OpenAIConfig>>,
        config: &AppConfig,
        pipeline_config: PipelineConfig,
    ) -> Result<Self, AppError> {
        let services = DefaultPipelineServices::new(openai_client, config, &pipeline_config);

        Self::with_services(db, pipeline_config, Arc::new(services))
    }

    pub fn with_services(
        db: Arc<SurrealDbClient>,
        pipeline_config: PipelineConfig,
        services: Arc<dyn PipelineServices>,
    ) -> Result<Self, AppError> {
        pipeline_config.tuning.chunking.validate()?;
        let registry = TransformRegistry::new(&pipeline_config.transforms);

        Ok(Self {
            db,
            pipeline_config,
            services,
            registry,
        })
    }

    /// Replaces the transform registry, e.g. to swap in a custom transform.
    #[must_use]
    pub fn with_registry(mut self, registry: TransformRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.pipeline_config
    }

    pub fn db(&self) -> &SurrealDbClient {
        self.db.as_ref()
    }

    /// Runs one file through extract, clean, privacy scrub, optional QA generation and export.
    ///
    /// Failures are reported through the envelope; the task row is left untouched.
    #[tracing::instrument(
        skip_all,
        fields(task_id = %request.task_id, file_name = %request.file_name)
    )]
    pub async fn process_file(&self, request: ProcessFileRequest) -> Envelope<ExportSummary> {
        match self.drive_pipeline(&request).await {
            Ok(summary) => Envelope::ok(summary),
            Err(err) => Envelope::failed(err.to_string(), ExportSummary::default()),
        }
    }

    fn duration_millis(duration: Duration) -> u64 {
        u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
    }

    async fn drive_pipeline(&self, request: &ProcessFileRequest) -> Result<ExportSummary, AppError> {
        let recorder = DetailRecorder::new(self.db.as_ref(), &request.task_id, &request.file_name);
        let mut ctx = PipelineContext::new(
            request,
            &self.pipeline_config,
            self.services.as_ref(),
            &self.registry,
            recorder,
        );

        let machine = ready();
        let pipeline_started = Instant::now();

        let machine = extract(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;

        let stage_start = Instant::now();
        let machine = clean(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let machine = scrub(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let transform_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let machine = generate(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let generate_duration = stage_start.elapsed();

        let _machine = export(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;

        info!(
            task_id = %request.task_id,
            file_name = %request.file_name,
            details_recorded = ctx.details_recorded,
            object_name = %ctx.summary.object_name,
            object_count = ctx.summary.object_count,
            total_ms = Self::duration_millis(pipeline_started.elapsed()),
            transform_ms = Self::duration_millis(transform_duration),
            generate_ms = Self::duration_millis(generate_duration),
            "transform pipeline finished"
        );

        Ok(ctx.summary)
    }
}
