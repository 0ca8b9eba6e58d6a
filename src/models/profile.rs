use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Athlete profile supplied by the host app
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
  pub age: u32,
  pub gender: String,
  pub weight_kg: f64,
  pub height_cm: f64,
  pub goal: String,
  pub days_per_week: u8,
  pub equipment_access: String,
  pub duration_target_min: Option<u32>,
}

impl Default for UserProfile {
  fn default() -> Self {
    Self {
      age: 30,
      gender: "unspecified".to_string(),
      weight_kg: 75.0,
      height_cm: 175.0,
      goal: "general strength".to_string(),
      days_per_week: 3,
      equipment_access: "full gym".to_string(),
      duration_target_min: None,
    }
  }
}

impl UserProfile {
  /// Training days capped at what a week can hold. Zero means a rest week.
  pub fn training_days(&self) -> usize {
    self.days_per_week.min(7) as usize
  }
}

/// Read-only catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExerciseCatalogEntry {
  pub name: String,
  pub is_timed: bool,
  pub default_duration_sec: Option<u32>,
  pub equipment_needed: Option<String>,
}

/// One performed set from the training log
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecentLogEntry {
  pub exercise_name: String,
  pub performed_at: DateTime<Utc>,
  pub weight: Option<f64>,
  pub reps: Option<u32>,
}

impl RecentLogEntry {
  /// Positive load and 1-8 reps
  pub fn is_heavy(&self) -> bool {
    let loaded = self.weight.is_some_and(|w| w > 0.0);
    let low_reps = self.reps.is_some_and(|r| (1..=8).contains(&r));
    loaded && low_reps
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MissedWorkout {
  pub scheduled_for: NaiveDate,
  pub title: String,
}
