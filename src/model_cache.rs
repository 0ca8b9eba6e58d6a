//! Memoized model-name selection
//!
//! Resolving a usable model costs a network round trip, so the chosen name is
//! kept for a freshness window and dropped when the service reports the model
//! (or itself) unavailable. The cache is an explicit value handed to the
//! pipeline rather than process-global state.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::PlannerConfig;

/// Five-minute freshness window
pub const DEFAULT_MODEL_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CachedModel {
  name: String,
  stored_at: Instant,
}

#[derive(Debug)]
pub struct ModelCache {
  ttl: Duration,
  entry: Mutex<Option<CachedModel>>,
}

impl Default for ModelCache {
  fn default() -> Self {
    Self::new(DEFAULT_MODEL_TTL)
  }
}

impl ModelCache {
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      entry: Mutex::new(None),
    }
  }

  pub fn from_config(config: &PlannerConfig) -> Self {
    Self::new(config.model_cache_ttl)
  }

  /// The cached model name, if one was stored within the freshness window
  pub fn get(&self) -> Option<String> {
    let guard = self.entry.lock().unwrap_or_else(|e| e.into_inner());
    guard
      .as_ref()
      .filter(|cached| cached.stored_at.elapsed() < self.ttl)
      .map(|cached| cached.name.clone())
  }

  pub fn store(&self, name: &str) {
    let mut guard = self.entry.lock().unwrap_or_else(|e| e.into_inner());
    *guard = Some(CachedModel {
      name: name.to_string(),
      stored_at: Instant::now(),
    });
  }

  pub fn invalidate(&self) {
    let mut guard = self.entry.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(cached) = guard.take() {
      tracing::info!(model = %cached.name, "Invalidated cached model selection");
    }
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }
}
