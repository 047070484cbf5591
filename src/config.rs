use anyhow::Context;
use std::env;
use std::path::PathBuf;

/// Runtime configuration, read once at startup and handed to the
/// components that need it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database file path; `None` means the platform data directory.
    pub database_path: Option<PathBuf>,
    pub api_prefix: String,
    pub allowed_origins: Vec<String>,
    pub model: ModelConfig,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
        let base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model = env::var("FABULA_MODEL").unwrap_or_else(|_| "qwen-max".to_string());

        Ok(Self {
            database_path: env::var("FABULA_DATABASE_PATH").ok().map(PathBuf::from),
            api_prefix: env::var("FABULA_API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            allowed_origins: parse_origins(&env::var("ALLOWED_ORIGINS").unwrap_or_default()),
            model: ModelConfig {
                api_key,
                base_url,
                model,
            },
        })
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
