use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use common::error::AppError;

pub const GENERATION_TEMPERATURE: f32 = 0.9;
pub const GENERATION_TOP_P: f32 = 0.7;

/// Sends one prompt to a generative model and returns its text reply.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AppError>;
}

pub struct OpenAiCompletionClient {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiCompletionClient {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(GENERATION_TEMPERATURE)
            .top_p(GENERATION_TOP_P)
            .messages([ChatCompletionRequestUserMessage::from(prompt.to_string()).into()])
            .build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::LLMParsing("No content found in LLM response".into()))
    }
}
