//! Environment configuration
//!
//! Values come from the process environment, after loading a `.env` file if
//! one exists.

use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::model_cache::DEFAULT_MODEL_TTL;

/// ---------------------------------------------------------------------------
/// Defaults
/// ---------------------------------------------------------------------------

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
  #[error("Missing configuration: {0}")]
  Missing(String),

  #[error("Invalid value for {key}: {value}")]
  Invalid { key: String, value: String },
}

/// ---------------------------------------------------------------------------
/// Config
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PlannerConfig {
  pub api_key: String,
  pub api_url: String,
  pub default_model: String,
  pub max_tokens: u32,
  pub model_cache_ttl: Duration,
  pub db_path: Option<String>,
}

impl PlannerConfig {
  /// Load `.env` (if present) and read the environment
  pub fn load() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();
    Self::from_env()
  }

  pub fn from_env() -> Result<Self, ConfigError> {
    let api_key = env::var("ANTHROPIC_API_KEY")
      .ok()
      .filter(|k| !k.trim().is_empty())
      .ok_or_else(|| ConfigError::Missing("ANTHROPIC_API_KEY".into()))?;

    let max_tokens = parse_var("PLANNER_MAX_TOKENS")?.unwrap_or(DEFAULT_MAX_TOKENS);
    let model_cache_ttl = parse_var::<u64>("PLANNER_MODEL_CACHE_TTL_SECS")?
      .map(Duration::from_secs)
      .unwrap_or(DEFAULT_MODEL_TTL);

    Ok(Self {
      api_key,
      api_url: env::var("PLANNER_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
      default_model: env::var("PLANNER_DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
      max_tokens,
      model_cache_ttl,
      db_path: env::var("PLANNER_DB_PATH").ok(),
    })
  }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
  match env::var(key) {
    Ok(value) => value
      .trim()
      .parse::<T>()
      .map(Some)
      .map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value,
      }),
    Err(_) => Ok(None),
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
