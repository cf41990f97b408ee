use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::screening::pipeline::ScreeningConfig;

const DEFAULT_LLM_MODELS: &str = "claude-sonnet-4-5,claude-haiku-4-5";
const DEFAULT_EMBEDDING_API_URL: &str = "https://api.openai.com/v1/embeddings";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Application configuration loaded from environment variables.
/// Every variable is optional; a missing provider key disables that provider
/// and the pipeline runs on its deterministic fallbacks.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub anthropic_api_key: Option<String>,
    /// Ordered model list, tried first-success.
    pub llm_models: Vec<String>,
    pub enable_llm_explanations: bool,
    pub embedding_api_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    pub max_files: usize,
    pub max_file_bytes: usize,
    pub min_text_chars: usize,
    pub concurrency: usize,
    pub resume_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            anthropic_api_key: None,
            llm_models: split_list(DEFAULT_LLM_MODELS),
            enable_llm_explanations: true,
            embedding_api_url: DEFAULT_EMBEDDING_API_URL.to_string(),
            embedding_api_key: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            max_files: 20,
            max_file_bytes: 8 * 1024 * 1024,
            min_text_chars: 200,
            concurrency: 4,
            resume_timeout: Duration::from_secs(120),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();

        Ok(Config {
            port: parse_env("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            llm_models: optional_env("LLM_MODELS")
                .map(|v| split_list(&v))
                .filter(|models| !models.is_empty())
                .unwrap_or(defaults.llm_models),
            enable_llm_explanations: parse_env(
                "ENABLE_LLM_EXPLANATIONS",
                defaults.enable_llm_explanations,
            )?,
            embedding_api_url: optional_env("EMBEDDING_API_URL")
                .unwrap_or(defaults.embedding_api_url),
            embedding_api_key: optional_env("EMBEDDING_API_KEY"),
            embedding_model: optional_env("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            max_files: parse_env("SCREENING_MAX_FILES", defaults.max_files)?,
            max_file_bytes: parse_env("SCREENING_MAX_FILE_BYTES", defaults.max_file_bytes)?,
            min_text_chars: parse_env("SCREENING_MIN_TEXT_CHARS", defaults.min_text_chars)?,
            concurrency: parse_env("SCREENING_CONCURRENCY", defaults.concurrency)?,
            resume_timeout: Duration::from_secs(parse_env(
                "SCREENING_RESUME_TIMEOUT_SECS",
                defaults.resume_timeout.as_secs(),
            )?),
        })
    }

    /// The slice of configuration the screening pipeline is constructed with.
    pub fn screening(&self) -> ScreeningConfig {
        ScreeningConfig {
            min_text_chars: self.min_text_chars,
            explanations_enabled: self.enable_llm_explanations,
            concurrency: self.concurrency.max(1),
            resume_timeout: self.resume_timeout,
        }
    }

    /// Upper bound for a whole multipart upload: every file at its cap plus form overhead.
    pub fn body_limit(&self) -> usize {
        self.max_files
            .saturating_mul(self.max_file_bytes)
            .saturating_add(1024 * 1024)
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_drops_empty() {
        assert_eq!(
            split_list(" claude-sonnet-4-5 , ,claude-haiku-4-5,"),
            vec!["claude-sonnet-4-5", "claude-haiku-4-5"]
        );
    }

    #[test]
    fn test_defaults_match_documented_limits() {
        let config = Config::default();
        assert_eq!(config.max_files, 20);
        assert_eq!(config.max_file_bytes, 8 * 1024 * 1024);
        assert_eq!(config.min_text_chars, 200);
        assert_eq!(config.llm_models.len(), 2);
        assert!(config.anthropic_api_key.is_none());
    }

    #[test]
    fn test_screening_config_never_has_zero_concurrency() {
        let config = Config {
            concurrency: 0,
            ..Config::default()
        };
        assert_eq!(config.screening().concurrency, 1);
    }

    #[test]
    fn test_body_limit_covers_all_files() {
        let config = Config::default();
        assert!(config.body_limit() > config.max_files * config.max_file_bytes);
    }
}
