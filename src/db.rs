use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::PlannerConfig;
use crate::models::{ExerciseCatalogEntry, MissedWorkout, RecentLogEntry};

pub type DbPool = SqlitePool;

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("No database path configured (set PLANNER_DB_PATH)")]
  NotConfigured,
}

/// Open (creating if needed) the SQLite file at `db_path` and run migrations
pub async fn initialize_db(db_path: &Path) -> Result<DbPool, StoreError> {
  if let Some(parent) = db_path.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent)?;
    }
  }
  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

  tracing::info!(path = %db_path.display(), "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("Database initialized successfully");

  Ok(pool)
}

/// Exercise names split by origin
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExerciseNames {
  pub catalog: Vec<String>,
  pub custom: Vec<String>,
}

/// Read-only lookups the planner needs
#[derive(Debug, Clone)]
pub struct TrainingStore {
  pool: DbPool,
}

impl TrainingStore {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }

  /// Open the store at the configured `db_path`
  pub async fn from_config(config: &PlannerConfig) -> Result<Self, StoreError> {
    let path = config.db_path.as_deref().ok_or(StoreError::NotConfigured)?;
    let pool = initialize_db(Path::new(path)).await?;
    Ok(Self::new(pool))
  }

  pub fn pool(&self) -> &DbPool {
    &self.pool
  }

  /// Catalog entries, with user-authored exercises appended
  pub async fn catalog(&self) -> Result<Vec<ExerciseCatalogEntry>, StoreError> {
    let entries = sqlx::query_as::<_, ExerciseCatalogEntry>(
      r#"
      SELECT name, is_timed, default_duration_sec, equipment_needed
      FROM exercise_catalog
      UNION ALL
      SELECT name, is_timed, default_duration_sec, NULL AS equipment_needed
      FROM user_exercises
      WHERE name NOT IN (SELECT name FROM exercise_catalog)
      ORDER BY name
      "#,
    )
    .fetch_all(&self.pool)
    .await?;

    Ok(entries)
  }

  pub async fn exercise_names(&self) -> Result<ExerciseNames, StoreError> {
    let catalog: Vec<String> = sqlx::query_scalar("SELECT name FROM exercise_catalog ORDER BY name")
      .fetch_all(&self.pool)
      .await?;
    let custom: Vec<String> = sqlx::query_scalar("SELECT name FROM user_exercises ORDER BY name")
      .fetch_all(&self.pool)
      .await?;

    Ok(ExerciseNames { catalog, custom })
  }

  /// Logged sets performed at or after `since`, newest first
  pub async fn recent_logs(&self, since: DateTime<Utc>) -> Result<Vec<RecentLogEntry>, StoreError> {
    let logs = sqlx::query_as::<_, RecentLogEntry>(
      r#"
      SELECT exercise_name, performed_at, weight, reps
      FROM exercise_logs
      WHERE performed_at >= ?1
      ORDER BY performed_at DESC
      "#,
    )
    .bind(since)
    .fetch_all(&self.pool)
    .await?;

    Ok(logs)
  }

  pub async fn missed_workouts(&self, since: NaiveDate) -> Result<Vec<MissedWorkout>, StoreError> {
    let missed = sqlx::query_as::<_, MissedWorkout>(
      r#"
      SELECT scheduled_for, title
      FROM missed_workouts
      WHERE scheduled_for >= ?1
      ORDER BY scheduled_for
      "#,
    )
    .bind(since)
    .fetch_all(&self.pool)
    .await?;

    Ok(missed)
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
