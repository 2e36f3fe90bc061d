use common::error::AppError;
use tracing::error;

use super::{
    config::PipelineConfig, recorder::DetailRecorder, services::PipelineServices, ExportSummary,
    ProcessFileRequest,
};
use crate::{qa::GeneratedQa, transforms::TransformRegistry};

pub struct PipelineContext<'a> {
    pub request: &'a ProcessFileRequest,
    pub pipeline_config: &'a PipelineConfig,
    pub services: &'a dyn PipelineServices,
    pub registry: &'a TransformRegistry,
    pub recorder: DetailRecorder<'a>,
    pub text: Option<String>,
    pub qa_pairs: Vec<GeneratedQa>,
    pub details_recorded: usize,
    pub summary: ExportSummary,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        request: &'a ProcessFileRequest,
        pipeline_config: &'a PipelineConfig,
        services: &'a dyn PipelineServices,
        registry: &'a TransformRegistry,
        recorder: DetailRecorder<'a>,
    ) -> Self {
        Self {
            request,
            pipeline_config,
            services,
            registry,
            recorder,
            text: None,
            qa_pairs: Vec::new(),
            details_recorded: 0,
            summary: ExportSummary::default(),
        }
    }

    pub fn text(&self) -> Result<&str, AppError> {
        self.text
            .as_deref()
            .ok_or_else(|| AppError::InternalError("document text expected to be available".into()))
    }

    pub fn take_text(&mut self) -> Result<String, AppError> {
        self.text.take().ok_or_else(|| {
            AppError::InternalError("document text expected to be available for transforms".into())
        })
    }

    pub fn abort(&self, err: AppError) -> AppError {
        error!(
            task_id = %self.request.task_id,
            file_name = %self.request.file_name,
            error = %err,
            "transform pipeline aborted"
        );
        err
    }
}
