pub mod chunking;
pub mod client;
pub mod parser;

use std::{sync::Arc, time::Duration};

use common::{error::AppError, utils::config::AppConfig};
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};
use tracing::{debug, info, instrument, warn};

use crate::utils::llm_instructions::qa_generation_prompt;

use self::{
    chunking::{split_into_chunks, ChunkSettings},
    client::CompletionClient,
    parser::QaResponseParser,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQa {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub timeout: Duration,
    /// Attempts per chunk, including the first call.
    pub max_attempts: usize,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_attempts: 1,
            retry_base_delay_ms: 250,
            retry_max_delay: Duration::from_secs(10),
        }
    }
}

impl From<&AppConfig> for GenerationSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.generation_timeout_secs),
            max_attempts: config.generation_max_attempts.max(1),
            ..Self::default()
        }
    }
}

/// Chunks cleaned text and asks the model for question/answer pairs per chunk.
///
/// A chunk whose model call fails, times out or returns unparseable output
/// contributes no pairs; the remaining chunks are still attempted.
pub struct QaGenerator {
    client: Arc<dyn CompletionClient>,
    parser: Arc<dyn QaResponseParser>,
    settings: GenerationSettings,
}

impl QaGenerator {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        parser: Arc<dyn QaResponseParser>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            client,
            parser,
            settings,
        }
    }

    /// Fails only when `chunking` is invalid.
    #[instrument(
        skip_all,
        fields(chunk_size = chunking.chunk_size, chunk_overlap = chunking.chunk_overlap)
    )]
    pub async fn generate(
        &self,
        text: &str,
        chunking: ChunkSettings,
    ) -> Result<Vec<GeneratedQa>, AppError> {
        let chunks = split_into_chunks(text, chunking)?;

        let mut pairs = Vec::new();
        let mut failed_chunks = 0_usize;
        for (chunk_index, chunk) in chunks.iter().enumerate() {
            match self.generate_for_chunk(chunk).await {
                Ok(chunk_pairs) => {
                    debug!(chunk_index, pair_count = chunk_pairs.len(), "chunk generated");
                    pairs.extend(chunk_pairs);
                }
                Err(err) => {
                    failed_chunks = failed_chunks.saturating_add(1);
                    warn!(chunk_index, error = %err, "QA generation failed for chunk");
                }
            }
        }

        info!(
            chunk_count = chunks.len(),
            failed_chunks,
            pair_count = pairs.len(),
            "QA generation finished"
        );

        Ok(pairs)
    }

    async fn generate_for_chunk(&self, chunk: &str) -> Result<Vec<GeneratedQa>, AppError> {
        let prompt = qa_generation_prompt(chunk);
        let raw = self.call_model(&prompt).await?;
        self.parser.parse(&raw)
    }

    async fn call_model(&self, prompt: &str) -> Result<String, AppError> {
        let retry_strategy = ExponentialBackoff::from_millis(2)
            .factor(self.settings.retry_base_delay_ms.max(1))
            .max_delay(self.settings.retry_max_delay)
            .map(jitter)
            .take(self.settings.max_attempts.saturating_sub(1));

        let client = self.client.as_ref();
        let timeout = self.settings.timeout;

        Retry::spawn(retry_strategy, move || async move {
            match tokio::time::timeout(timeout, client.complete(prompt)).await {
                Ok(result) => result,
                Err(_) => Err(AppError::Timeout(format!(
                    "model call exceeded {}ms",
                    timeout.as_millis()
                ))),
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::{parser::MarkerQaParser, *};

    /// Answers each prompt from its content; prompts mentioning `fail_on` error out.
    struct ScriptedClient {
        fail_on: Option<&'static str>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                fail_on,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, prompt: &str) -> Result<String, AppError> {
            self.prompts.lock().await.push(prompt.to_string());
            if self.fail_on.is_some_and(|needle| prompt.contains(needle)) {
                return Err(AppError::Processing("model unavailable".into()));
            }
            let topic = ["Alpha", "Bravo", "Charlie"]
                .into_iter()
                .find(|word| prompt.contains(word))
                .unwrap_or("Other");
            Ok(format!("Q1: What about {topic}?\nA1: {topic} is covered.\nQ2: Empty?\nA2:"))
        }
    }

    struct FlakyClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionClient for FlakyClient {
        async fn complete(&self, _prompt: &str) -> Result<String, AppError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(AppError::Processing("transient".into()));
            }
            Ok("Q1: Retried?\nA1: Yes.".into())
        }
    }

    struct SlowClient;

    #[async_trait]
    impl CompletionClient for SlowClient {
        async fn complete(&self, _prompt: &str) -> Result<String, AppError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("Q1: Late?\nA1: Too late.".into())
        }
    }

    const THREE_PARAGRAPHS: &str =
        "Alpha paragraph text one.\n\nBravo paragraph text two.\n\nCharlie paragraph text three.";

    fn chunking() -> ChunkSettings {
        ChunkSettings {
            chunk_size: 40,
            chunk_overlap: 0,
        }
    }

    fn generator(client: Arc<dyn CompletionClient>, settings: GenerationSettings) -> QaGenerator {
        QaGenerator::new(client, Arc::new(MarkerQaParser), settings)
    }

    #[tokio::test]
    async fn failing_chunk_does_not_stop_other_chunks() {
        let client = Arc::new(ScriptedClient::new(Some("Bravo")));
        let generator = generator(client.clone(), GenerationSettings::default());

        let pairs = generator
            .generate(THREE_PARAGRAPHS, chunking())
            .await
            .expect("generation runs");

        let questions: Vec<_> = pairs.iter().map(|qa| qa.question.as_str()).collect();
        assert_eq!(questions, vec!["What about Alpha?", "What about Charlie?"]);
        assert_eq!(client.prompts.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn prompts_carry_the_instructions_and_chunk() {
        let client = Arc::new(ScriptedClient::new(None));
        let generator = generator(client.clone(), GenerationSettings::default());

        generator
            .generate("Alpha only.", chunking())
            .await
            .expect("generation runs");

        let prompts = client.prompts.lock().await;
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0], qa_generation_prompt("Alpha only."));
    }

    #[tokio::test]
    async fn retries_until_attempts_are_exhausted() {
        let client = Arc::new(FlakyClient {
            calls: AtomicUsize::new(0),
        });
        let settings = GenerationSettings {
            max_attempts: 2,
            retry_base_delay_ms: 1,
            ..GenerationSettings::default()
        };
        let generator = generator(client.clone(), settings);

        let pairs = generator
            .generate("Alpha only.", chunking())
            .await
            .expect("generation runs");

        assert_eq!(pairs.len(), 1);
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn single_attempt_does_not_retry() {
        let client = Arc::new(FlakyClient {
            calls: AtomicUsize::new(0),
        });
        let generator = generator(client.clone(), GenerationSettings::default());

        let pairs = generator
            .generate("Alpha only.", chunking())
            .await
            .expect("generation runs");

        assert!(pairs.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_model_calls_time_out_as_empty_chunks() {
        let settings = GenerationSettings {
            timeout: Duration::from_millis(20),
            ..GenerationSettings::default()
        };
        let generator = generator(Arc::new(SlowClient), settings);

        let pairs = generator
            .generate("Alpha only.", chunking())
            .await
            .expect("generation runs");
        assert!(pairs.is_empty());
    }

    #[tokio::test]
    async fn invalid_chunking_is_an_error() {
        let generator = generator(
            Arc::new(ScriptedClient::new(None)),
            GenerationSettings::default(),
        );
        let err = generator
            .generate(
                "text",
                ChunkSettings {
                    chunk_size: 0,
                    chunk_overlap: 0,
                },
            )
            .await
            .expect_err("invalid chunking");
        assert!(matches!(err, AppError::Validation(_)));
    }
}
