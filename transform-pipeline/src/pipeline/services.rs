use std::{path::PathBuf, sync::Arc};

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use common::{error::AppError, utils::config::AppConfig};

use super::config::PipelineConfig;
use crate::{
    qa::{
        chunking::ChunkSettings, client::OpenAiCompletionClient, parser::MarkerQaParser,
        GeneratedQa, QaGenerator,
    },
    utils::{
        csv_export::write_qa_csv,
        file_text_extraction::{extract_text_from_file, source_path},
    },
};

/// Collaborators the orchestrator reaches outside of its own process state.
#[async_trait]
pub trait PipelineServices: Send + Sync {
    async fn extract_text(&self, file_name: &str) -> Result<String, AppError>;

    async fn generate_qa(
        &self,
        text: &str,
        chunking: ChunkSettings,
    ) -> Result<Vec<GeneratedQa>, AppError>;

    /// Writes the QA table and returns the object name of the artifact.
    async fn export_qa(&self, file_name: &str, pairs: &[GeneratedQa]) -> Result<String, AppError>;
}

pub struct DefaultPipelineServices {
    data_dir: PathBuf,
    generator: QaGenerator,
}

impl DefaultPipelineServices {
    pub fn new(
        openai_client: Arc<Client<OpenAIConfig>>,
        config: &AppConfig,
        pipeline_config: &PipelineConfig,
    ) -> Self {
        let client = OpenAiCompletionClient::new(openai_client, config.processing_model.clone());
        let generator = QaGenerator::new(
            Arc::new(client),
            Arc::new(MarkerQaParser),
            pipeline_config.tuning.generation.clone(),
        );

        Self::with_generator(pipeline_config.data_dir.clone(), generator)
    }

    pub fn with_generator(data_dir: PathBuf, generator: QaGenerator) -> Self {
        Self {
            data_dir,
            generator,
        }
    }
}

#[async_trait]
impl PipelineServices for DefaultPipelineServices {
    async fn extract_text(&self, file_name: &str) -> Result<String, AppError> {
        let path = source_path(&self.data_dir, file_name)?;
        extract_text_from_file(&path).await
    }

    async fn generate_qa(
        &self,
        text: &str,
        chunking: ChunkSettings,
    ) -> Result<Vec<GeneratedQa>, AppError> {
        self.generator.generate(text, chunking).await
    }

    async fn export_qa(&self, file_name: &str, pairs: &[GeneratedQa]) -> Result<String, AppError> {
        write_qa_csv(&self.data_dir, file_name, pairs).await
    }
}
