//! LLM integration for plan generation
//!
//! This module handles communication with the Claude API. The pipeline only
//! sees the `PlanGenerator` trait, so tests can script responses without a
//! network.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{PlannerConfig, DEFAULT_API_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

const API_VERSION: &str = "2023-06-01";

/// Models tried in order when resolving, after the configured default
const PREFERRED_MODELS: [&str; 3] = [
  "claude-sonnet-4-20250514",
  "claude-3-7-sonnet-20250219",
  "claude-3-5-sonnet-20241022",
];

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum LlmError {
  #[error("API key not configured")]
  MissingApiKey,

  #[error("Request failed: {0}")]
  Request(String),

  #[error("API error: {0}")]
  Api(String),

  #[error("Parse error: {0}")]
  Parse(String),

  #[error("Model unavailable: {0}")]
  ModelUnavailable(String),

  #[error("Service unavailable: {0}")]
  ServiceUnavailable(String),
}

impl LlmError {
  /// Errors after which a cached model selection should be dropped
  pub fn invalidates_model(&self) -> bool {
    matches!(self, LlmError::ModelUnavailable(_) | LlmError::ServiceUnavailable(_))
  }
}

/// ---------------------------------------------------------------------------
/// Generator Trait
/// ---------------------------------------------------------------------------

/// The generative text service behind the pipeline. Output is untrusted text.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
  /// Pick a model identifier that the service currently serves
  async fn resolve_model(&self) -> Result<String, LlmError>;

  async fn generate(&self, model: &str, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError>;
}

/// ---------------------------------------------------------------------------
/// Claude API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ClaudeRequest {
  model: String,
  max_tokens: u32,
  system: String,
  messages: Vec<ClaudeMessage>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
  role: String,
  content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
  content: Vec<ContentBlock>,
  model: String,
  #[allow(dead_code)]
  stop_reason: Option<String>,
  usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
  #[serde(rename = "type")]
  content_type: String,
  text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
  pub input_tokens: u32,
  pub output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorResponse {
  error: ClaudeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorDetail {
  #[serde(rename = "type")]
  error_type: Option<String>,
  message: String,
}

#[derive(Debug, Deserialize)]
struct ModelList {
  data: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
  id: String,
}

/// ---------------------------------------------------------------------------
/// Claude Client
/// ---------------------------------------------------------------------------

pub struct ClaudeClient {
  client: Client,
  api_key: String,
  base_url: String,
  default_model: String,
  max_tokens: u32,
}

impl ClaudeClient {
  pub fn new(api_key: &str, base_url: &str, default_model: &str, max_tokens: u32) -> Result<Self, LlmError> {
    if api_key.trim().is_empty() {
      return Err(LlmError::MissingApiKey);
    }

    Ok(Self {
      client: Client::new(),
      api_key: api_key.to_string(),
      base_url: base_url.trim_end_matches('/').to_string(),
      default_model: default_model.to_string(),
      max_tokens,
    })
  }

  pub fn from_config(config: &PlannerConfig) -> Result<Self, LlmError> {
    Self::new(&config.api_key, &config.api_url, &config.default_model, config.max_tokens)
  }

  /// Create a client with default endpoint settings, loading the API key from environment
  pub fn from_env() -> Result<Self, LlmError> {
    let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| LlmError::MissingApiKey)?;
    Self::new(&api_key, DEFAULT_API_URL, DEFAULT_MODEL, DEFAULT_MAX_TOKENS)
  }

  pub fn default_model(&self) -> &str {
    &self.default_model
  }

  /// Call Claude with a system prompt and user message
  pub async fn complete(
    &self,
    model: &str,
    system_prompt: &str,
    user_message: &str,
  ) -> Result<(String, Usage), LlmError> {
    let request = ClaudeRequest {
      model: model.to_string(),
      max_tokens: self.max_tokens,
      system: system_prompt.to_string(),
      messages: vec![ClaudeMessage {
        role: "user".to_string(),
        content: user_message.to_string(),
      }],
    };

    let response = self
      .client
      .post(format!("{}/v1/messages", self.base_url))
      .header("x-api-key", &self.api_key)
      .header("anthropic-version", API_VERSION)
      .header("content-type", "application/json")
      .json(&request)
      .send()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    if !status.is_success() {
      return Err(map_error_response(status, &body));
    }

    let claude_response: ClaudeResponse =
      serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

    // Extract text from the first text content block
    let text = claude_response
      .content
      .iter()
      .find(|c| c.content_type == "text")
      .and_then(|c| c.text.clone())
      .ok_or_else(|| LlmError::Parse("No text content in response".to_string()))?;

    tracing::debug!(
      model = %claude_response.model,
      input_tokens = claude_response.usage.input_tokens,
      output_tokens = claude_response.usage.output_tokens,
      "Claude completion received"
    );

    Ok((text, claude_response.usage))
  }

  /// Model identifiers the API currently lists
  pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
    let response = self
      .client
      .get(format!("{}/v1/models", self.base_url))
      .header("x-api-key", &self.api_key)
      .header("anthropic-version", API_VERSION)
      .send()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    if !status.is_success() {
      return Err(map_error_response(status, &body));
    }

    let list: ModelList = serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;
    Ok(list.data.into_iter().map(|m| m.id).collect())
  }
}

#[async_trait]
impl PlanGenerator for ClaudeClient {
  async fn resolve_model(&self) -> Result<String, LlmError> {
    let available = match self.list_models().await {
      Ok(ids) => ids,
      Err(e @ LlmError::ServiceUnavailable(_)) => return Err(e),
      Err(e) => {
        tracing::warn!(error = %e, "Model listing failed, using default model");
        return Ok(self.default_model.clone());
      }
    };

    let choice = std::iter::once(self.default_model.as_str())
      .chain(PREFERRED_MODELS)
      .find(|candidate| available.iter().any(|id| id == candidate))
      .unwrap_or(self.default_model.as_str())
      .to_string();

    tracing::info!(model = %choice, "Resolved generation model");
    Ok(choice)
  }

  async fn generate(&self, model: &str, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
    let (text, _usage) = self.complete(model, system_prompt, user_prompt).await?;
    Ok(text)
  }
}

/// Classify a non-success response
fn map_error_response(status: StatusCode, body: &str) -> LlmError {
  let detail = serde_json::from_str::<ClaudeErrorResponse>(body).ok().map(|r| r.error);
  let message = detail
    .as_ref()
    .map(|d| d.message.clone())
    .unwrap_or_else(|| format!("HTTP {}: {}", status, body));
  let error_type = detail.as_ref().and_then(|d| d.error_type.as_deref());

  match (status.as_u16(), error_type) {
    (404, _) | (_, Some("not_found_error")) => LlmError::ModelUnavailable(message),
    (429 | 500 | 502 | 503 | 529, _) | (_, Some("overloaded_error")) => LlmError::ServiceUnavailable(message),
    _ => LlmError::Api(message),
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
