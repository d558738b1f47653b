// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Fetch pacing and HTTP behavior
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// LLM extractor credentials and model selection
    #[serde(default)]
    pub llm: LlmConfig,

    /// Database and cache locations
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scrape.user_agent.trim().is_empty() {
            return Err(AppError::validation("scrape.user_agent is empty"));
        }
        if self.scrape.timeout_secs == 0 {
            return Err(AppError::validation("scrape.timeout_secs must be > 0"));
        }
        if self.scrape.max_events_per_unit == 0 {
            return Err(AppError::validation(
                "scrape.max_events_per_unit must be > 0",
            ));
        }
        if !(1..=10).contains(&self.scrape.min_importance) {
            return Err(AppError::validation(
                "scrape.min_importance must be within 1-10",
            ));
        }
        if self.storage.database_path.trim().is_empty() {
            return Err(AppError::validation("storage.database_path is empty"));
        }
        if self.storage.cache_dir.trim().is_empty() {
            return Err(AppError::validation("storage.cache_dir is empty"));
        }
        Ok(())
    }
}

/// Fetch pacing and HTTP behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Cooldown between work-units in milliseconds
    #[serde(default = "defaults::unit_delay")]
    pub unit_delay_ms: u64,

    /// Maximum events the extractor may return per work-unit
    #[serde(default = "defaults::max_events_per_unit")]
    pub max_events_per_unit: usize,

    /// Minimum importance level kept by sweeps
    #[serde(default = "defaults::min_importance")]
    pub min_importance: i64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            unit_delay_ms: defaults::unit_delay(),
            max_events_per_unit: defaults::max_events_per_unit(),
            min_importance: defaults::min_importance(),
        }
    }
}

/// LLM extractor settings.
///
/// `api_key` may be left out of the config file and supplied through the
/// `OPENAI_API_KEY` environment variable instead; the same applies to
/// `OPENAI_BASE_URL` and `OPENAI_MODEL`. Resolution happens once, here;
/// nothing else reads the process environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "defaults::llm_base_url")]
    pub base_url: String,

    #[serde(default = "defaults::llm_model")]
    pub model: String,

    #[serde(default = "defaults::llm_temperature")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: defaults::llm_base_url(),
            model: defaults::llm_model(),
            temperature: defaults::llm_temperature(),
        }
    }
}

impl LlmConfig {
    /// Merge environment fallbacks into a copy of this config.
    pub fn resolve(&self) -> Self {
        let mut resolved = self.clone();
        if resolved.api_key.is_none() {
            resolved.api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            if self.base_url == defaults::llm_base_url() && !base_url.is_empty() {
                resolved.base_url = base_url;
            }
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            if self.model == defaults::llm_model() && !model.is_empty() {
                resolved.model = model;
            }
        }
        resolved
    }
}

/// Database and cache locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file
    #[serde(default = "defaults::database_path")]
    pub database_path: String,

    /// Root directory for the two-tier cache
    #[serde(default = "defaults::cache_dir")]
    pub cache_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: defaults::database_path(),
            cache_dir: defaults::cache_dir(),
        }
    }
}

mod defaults {
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; chronicle/1.0)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn unit_delay() -> u64 {
        500
    }
    pub fn max_events_per_unit() -> usize {
        20
    }
    pub fn min_importance() -> i64 {
        5
    }

    pub fn llm_base_url() -> String {
        "https://api.openai.com/v1".into()
    }
    pub fn llm_model() -> String {
        "gpt-4o-mini".into()
    }
    pub fn llm_temperature() -> f32 {
        0.3
    }

    pub fn database_path() -> String {
        "data.db".into()
    }
    pub fn cache_dir() -> String {
        "cache".into()
    }
}
