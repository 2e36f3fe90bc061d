use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub surrealdb_address: String,
    pub surrealdb_username: String,
    pub surrealdb_password: String,
    pub surrealdb_namespace: String,
    pub surrealdb_database: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_processing_model")]
    pub processing_model: String,
    #[serde(default = "default_chunk_size")]
    pub knowledge_chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub knowledge_chunk_overlap: usize,
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,
    #[serde(default = "default_generation_max_attempts")]
    pub generation_max_attempts: usize,
    #[serde(default = "default_email_replace_token")]
    pub email_replace_token: String,
    #[serde(default = "default_preview_rows_per_file")]
    pub preview_rows_per_file: usize,
    #[serde(default = "default_preview_max_chars")]
    pub preview_max_chars: usize,
    #[serde(default)]
    pub enable_extended_clean_stages: bool,
    #[serde(default)]
    pub finalize_task_status: bool,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_processing_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_generation_timeout_secs() -> u64 {
    120
}

fn default_generation_max_attempts() -> usize {
    1
}

pub fn default_email_replace_token() -> String {
    "T:EMAIL".to_string()
}

fn default_preview_rows_per_file() -> usize {
    10
}

fn default_preview_max_chars() -> usize {
    2_000
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}

#[cfg(any(test, feature = "test-utils"))]
impl AppConfig {
    /// Configuration pointing at an in-memory database, used by tests across the workspace.
    pub fn for_tests(data_dir: &str) -> Self {
        Self {
            openai_api_key: "test-key".into(),
            surrealdb_address: "mem://".into(),
            surrealdb_username: "root".into(),
            surrealdb_password: "root".into(),
            surrealdb_namespace: "test".into(),
            surrealdb_database: "test".into(),
            data_dir: data_dir.into(),
            http_port: default_http_port(),
            openai_base_url: default_base_url(),
            processing_model: default_processing_model(),
            knowledge_chunk_size: default_chunk_size(),
            knowledge_chunk_overlap: default_chunk_overlap(),
            generation_timeout_secs: default_generation_timeout_secs(),
            generation_max_attempts: default_generation_max_attempts(),
            email_replace_token: default_email_replace_token(),
            preview_rows_per_file: default_preview_rows_per_file(),
            preview_max_chars: default_preview_max_chars(),
            enable_extended_clean_stages: false,
            finalize_task_status: false,
        }
    }
}
