//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock data factories
//! - A scripted plan generator
//! - Helper assertions

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::config::{PlannerConfig, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::llm::{LlmError, PlanGenerator};
use crate::models::{ExerciseCatalogEntry, RecentLogEntry, UserProfile};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Seed a small catalog plus one user-authored exercise
pub async fn seed_test_catalog(pool: &SqlitePool) {
  let entries: [(&str, bool, Option<u32>, Option<&str>); 6] = [
    ("Back Squat", false, None, Some("barbell")),
    ("Romanian Deadlift", false, None, Some("barbell")),
    ("Bench Press", false, None, Some("barbell")),
    ("Barbell Row", false, None, Some("barbell")),
    ("Plank", true, Some(45), None),
    ("Farmer Carry", true, Some(40), Some("dumbbell")),
  ];

  for (name, is_timed, duration, equipment) in entries {
    sqlx::query(
      r#"
      INSERT INTO exercise_catalog (name, is_timed, default_duration_sec, equipment_needed)
      VALUES (?1, ?2, ?3, ?4)
      "#,
    )
    .bind(name)
    .bind(is_timed)
    .bind(duration)
    .bind(equipment)
    .execute(pool)
    .await
    .expect("Failed to seed catalog entry");
  }

  sqlx::query("INSERT INTO user_exercises (name, is_timed) VALUES (?1, ?2)")
    .bind("Sled Push")
    .bind(false)
    .execute(pool)
    .await
    .expect("Failed to seed user exercise");
}

/// Seed logged sets spread over the last three weeks
pub async fn seed_test_logs(pool: &SqlitePool, now: DateTime<Utc>) {
  for log in mock_recent_logs(now) {
    sqlx::query(
      r#"
      INSERT INTO exercise_logs (exercise_name, performed_at, weight, reps)
      VALUES (?1, ?2, ?3, ?4)
      "#,
    )
    .bind(&log.exercise_name)
    .bind(log.performed_at)
    .bind(log.weight)
    .bind(log.reps)
    .execute(pool)
    .await
    .expect("Failed to seed exercise log");
  }
}

/// Seed one recent and one old missed workout
pub async fn seed_test_missed_workouts(pool: &SqlitePool, today: NaiveDate) {
  let rows = [(today - Duration::days(2), "Upper A"), (today - Duration::days(30), "Lower B")];
  for (date, title) in rows {
    sqlx::query("INSERT INTO missed_workouts (scheduled_for, title) VALUES (?1, ?2)")
      .bind(date)
      .bind(title)
      .execute(pool)
      .await
      .expect("Failed to seed missed workout");
  }
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn mock_config(api_url: &str, db_path: Option<&str>) -> PlannerConfig {
  PlannerConfig {
    api_key: "sk-test".to_string(),
    api_url: api_url.to_string(),
    default_model: DEFAULT_MODEL.to_string(),
    max_tokens: DEFAULT_MAX_TOKENS,
    model_cache_ttl: std::time::Duration::from_secs(300),
    db_path: db_path.map(str::to_string),
  }
}

pub fn mock_profile(days_per_week: u8) -> UserProfile {
  UserProfile {
    age: 34,
    gender: "female".to_string(),
    weight_kg: 68.0,
    height_cm: 170.0,
    goal: "strength".to_string(),
    days_per_week,
    equipment_access: "full gym".to_string(),
    duration_target_min: None,
  }
}

pub fn mock_catalog() -> Vec<ExerciseCatalogEntry> {
  vec![
    ExerciseCatalogEntry {
      name: "Back Squat".to_string(),
      is_timed: false,
      default_duration_sec: None,
      equipment_needed: Some("barbell".to_string()),
    },
    ExerciseCatalogEntry {
      name: "Plank".to_string(),
      is_timed: true,
      default_duration_sec: Some(45),
      equipment_needed: None,
    },
  ]
}

pub fn mock_log(name: &str, performed_at: DateTime<Utc>, weight: Option<f64>, reps: u32) -> RecentLogEntry {
  RecentLogEntry {
    exercise_name: name.to_string(),
    performed_at,
    weight,
    reps: Some(reps),
  }
}

pub fn mock_recent_logs(now: DateTime<Utc>) -> Vec<RecentLogEntry> {
  vec![
    mock_log("Back Squat", now - Duration::hours(24), Some(100.0), 5),
    mock_log("Bench Press", now - Duration::days(3), Some(70.0), 8),
    mock_log("Barbell Row", now - Duration::days(5), Some(60.0), 10),
    mock_log("Romanian Deadlift", now - Duration::days(10), Some(90.0), 8),
    mock_log("Back Squat", now - Duration::days(20), Some(95.0), 5),
  ]
}

/// ---------------------------------------------------------------------------
/// Scripted Generator
/// ---------------------------------------------------------------------------

/// Returns queued responses in order and counts calls
pub struct ScriptedGenerator {
  model: String,
  responses: Mutex<VecDeque<Result<String, LlmError>>>,
  resolve_calls: AtomicUsize,
  generate_calls: AtomicUsize,
  last_prompt: Mutex<Option<String>>,
}

impl ScriptedGenerator {
  pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
    Self {
      model: "claude-sonnet-4-20250514".to_string(),
      responses: Mutex::new(responses.into()),
      resolve_calls: AtomicUsize::new(0),
      generate_calls: AtomicUsize::new(0),
      last_prompt: Mutex::new(None),
    }
  }

  pub fn with_text(text: &str) -> Self {
    Self::new(vec![Ok(text.to_string())])
  }

  pub fn resolve_calls(&self) -> usize {
    self.resolve_calls.load(Ordering::SeqCst)
  }

  pub fn generate_calls(&self) -> usize {
    self.generate_calls.load(Ordering::SeqCst)
  }

  pub fn last_prompt(&self) -> Option<String> {
    self.last_prompt.lock().unwrap().clone()
  }
}

#[async_trait]
impl PlanGenerator for ScriptedGenerator {
  async fn resolve_model(&self) -> Result<String, LlmError> {
    self.resolve_calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.model.clone())
  }

  async fn generate(&self, _model: &str, _system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
    self.generate_calls.fetch_add(1, Ordering::SeqCst);
    *self.last_prompt.lock().unwrap() = Some(user_prompt.to_string());
    self
      .responses
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| Err(LlmError::Api("no scripted response left".to_string())))
  }
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('exercise_catalog', 'user_exercises', 'exercise_logs', 'missed_workouts')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 4, "Expected 4 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_scripted_generator_replays_in_order() {
    let generator = ScriptedGenerator::new(vec![
      Ok("first".to_string()),
      Err(LlmError::ServiceUnavailable("down".to_string())),
    ]);

    assert_eq!(generator.generate("m", "s", "p1").await.unwrap(), "first");
    assert!(generator.generate("m", "s", "p2").await.is_err());
    assert!(matches!(generator.generate("m", "s", "p3").await, Err(LlmError::Api(_))));
    assert_eq!(generator.generate_calls(), 3);
    assert_eq!(generator.last_prompt().as_deref(), Some("p3"));
  }

  #[test]
  fn test_mock_logs_include_recent_heavy_squat() {
    let now = Utc::now();
    let logs = mock_recent_logs(now);

    let squat = &logs[0];
    assert!(squat.is_heavy());
    assert_approx_eq!((now - squat.performed_at).num_hours() as f64, 24.0, 0.5);
  }
}
