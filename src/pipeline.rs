//! Plan synthesis pipeline
//!
//! Builds the prompt, calls the generator, then turns its untrusted text into
//! a resolved `WeekSchedule`:
//! extract -> normalize -> limit training days -> classify + resolve volume
//! -> compress (when a duration target is set).
//!
//! Coverage and recovery reports are advisory. They shape the prompt and are
//! returned alongside the schedule, but never modify it.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::classify::{classify_movement, classify_tier};
use crate::compression::{compress_day, CompressionResult, SetDurationEstimator, TempoEstimator};
use crate::coverage::CoverageAnalysisResult;
use crate::extract::{extract_structure, ExtractError};
use crate::llm::{LlmError, PlanGenerator};
use crate::model_cache::ModelCache;
use crate::models::{
  Day, ExerciseCatalogEntry, ExerciseSlot, MissedWorkout, RecentLogEntry, RepTarget, UserProfile, WeekSchedule,
};
use crate::prompt::{build_plan_prompt, merge_exercise_names, PromptContext, PLANNER_SYSTEM_PROMPT};
use crate::recovery::RecoveryReport;
use crate::validate::{normalize_week, ValidationError, ValidationWarning};
use crate::volume::resolve_slot;

/// Hold or interval length when nothing else specifies one
pub const DEFAULT_TIMED_DURATION_SEC: u32 = 30;

static DEFAULT_ESTIMATOR: TempoEstimator = TempoEstimator {
  warmup_buffer_sec: 60.0,
};

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum PlanError {
  #[error("Could not parse the generated plan: {0}")]
  Parse(#[from] ExtractError),

  #[error("Generated plan has no usable week schedule: {0}")]
  StructureInvalid(String),

  #[error("Plan generation service unavailable: {0}")]
  ServiceUnavailable(String),

  #[error("Plan generation failed: {0}")]
  Generation(LlmError),
}

impl PlanError {
  /// Whether calling again may succeed without any change on the caller's side
  pub fn is_retryable(&self) -> bool {
    matches!(self, PlanError::Parse(_) | PlanError::ServiceUnavailable(_))
  }
}

impl From<ValidationError> for PlanError {
  fn from(err: ValidationError) -> Self {
    match err {
      ValidationError::StructureInvalid(msg) => PlanError::StructureInvalid(msg),
    }
  }
}

impl From<LlmError> for PlanError {
  fn from(err: LlmError) -> Self {
    match err {
      LlmError::ModelUnavailable(msg) | LlmError::ServiceUnavailable(msg) => PlanError::ServiceUnavailable(msg),
      other => PlanError::Generation(other),
    }
  }
}

impl Serialize for PlanError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Request / Outcome
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
  pub profile: UserProfile,
  /// Names from the shared catalog
  pub catalog_names: Vec<String>,
  /// Names the user authored
  pub custom_names: Vec<String>,
  /// Timed flags and default durations
  pub catalog: Vec<ExerciseCatalogEntry>,
  pub recent_logs: Vec<RecentLogEntry>,
  pub missed_workouts: Vec<MissedWorkout>,
  /// Overrides `profile.duration_target_min` when set
  pub duration_target_min: Option<u32>,
  /// The week currently planned, if any, for the pre-generation advisories
  pub current_schedule: Option<WeekSchedule>,
}

impl PlanRequest {
  pub fn new(profile: UserProfile) -> Self {
    Self {
      profile,
      ..Self::default()
    }
  }

  pub fn duration_target(&self) -> Option<u32> {
    self
      .duration_target_min
      .or(self.profile.duration_target_min)
      .filter(|m| *m > 0)
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
  pub model: String,
  pub schedule: WeekSchedule,
  /// Normalizer repairs, for diagnostics. Logged during the run and never
  /// serialized with the outcome.
  #[serde(skip)]
  pub warnings: Vec<ValidationWarning>,
  pub coverage: CoverageAnalysisResult,
  pub recovery: RecoveryReport,
  /// Per active day, only when a duration target was set
  pub compression: BTreeMap<Day, CompressionResult>,
}

/// ---------------------------------------------------------------------------
/// Pipeline
/// ---------------------------------------------------------------------------

pub struct PlanPipeline<'a> {
  generator: &'a dyn PlanGenerator,
  model_cache: &'a ModelCache,
  estimator: &'a dyn SetDurationEstimator,
}

impl<'a> PlanPipeline<'a> {
  pub fn new(generator: &'a dyn PlanGenerator, model_cache: &'a ModelCache) -> Self {
    Self {
      generator,
      model_cache,
      estimator: &DEFAULT_ESTIMATOR,
    }
  }

  pub fn with_estimator(mut self, estimator: &'a dyn SetDurationEstimator) -> Self {
    self.estimator = estimator;
    self
  }

  pub async fn run(&self, request: &PlanRequest) -> Result<PlanOutcome, PlanError> {
    self.run_at(request, Utc::now()).await
  }

  /// Run with an explicit clock, for the advisory windows
  pub async fn run_at(&self, request: &PlanRequest, now: DateTime<Utc>) -> Result<PlanOutcome, PlanError> {
    let training_days = request.profile.training_days();
    let duration_target = request.duration_target();
    tracing::info!(training_days, duration_target = ?duration_target, "Generating weekly plan");

    // Advisories for the prompt
    let current = request.current_schedule.as_ref();
    let prior_coverage = CoverageAnalysisResult::compute(current, &request.recent_logs, now);
    let prior_recovery = RecoveryReport::compute(&request.recent_logs, current, now);

    let names = merge_exercise_names(&request.catalog_names, &request.custom_names);
    let prompt = build_plan_prompt(&PromptContext {
      profile: &request.profile,
      duration_target_min: duration_target,
      exercise_names: &names,
      missed_workouts: &request.missed_workouts,
      coverage: &prior_coverage,
      recovery: &prior_recovery,
    });

    let model = self.resolve_model().await?;
    let raw = self
      .generator
      .generate(&model, PLANNER_SYSTEM_PROMPT, &prompt)
      .await
      .map_err(|e| self.on_service_error(e))?;

    let value = extract_structure(&raw)?;
    let normalized = normalize_week(&value)?;
    if !normalized.warnings.is_empty() {
      tracing::warn!(count = normalized.warnings.len(), "Repaired generated plan fields");
      for warning in &normalized.warnings {
        tracing::debug!(path = %warning.path, message = %warning.message, "Plan field repaired");
      }
    }

    let mut schedule = normalized.schedule;
    limit_training_days(&mut schedule, training_days);
    resolve_schedule(&mut schedule, &request.catalog, &request.recent_logs);

    let compression = match duration_target {
      Some(minutes) => compress_schedule(&mut schedule, minutes, self.estimator),
      None => BTreeMap::new(),
    };

    let coverage = CoverageAnalysisResult::compute(Some(&schedule), &request.recent_logs, now);
    let recovery = RecoveryReport::compute(&request.recent_logs, Some(&schedule), now);
    if recovery.has_conflicts() {
      tracing::warn!(conflicts = recovery.conflicts.len(), "Plan schedules still-recovering patterns");
    }

    tracing::info!(
      model = %model,
      active_days = schedule.active_days().len(),
      exercises = schedule.exercise_count(),
      "Plan generated"
    );

    Ok(PlanOutcome {
      model,
      schedule,
      warnings: normalized.warnings,
      coverage,
      recovery,
      compression,
    })
  }

  async fn resolve_model(&self) -> Result<String, PlanError> {
    if let Some(model) = self.model_cache.get() {
      return Ok(model);
    }

    let model = self
      .generator
      .resolve_model()
      .await
      .map_err(|e| self.on_service_error(e))?;
    self.model_cache.store(&model);
    Ok(model)
  }

  fn on_service_error(&self, err: LlmError) -> PlanError {
    if err.invalidates_model() {
      tracing::warn!(error = %err, "Generation service failure, dropping cached model");
      self.model_cache.invalidate();
    }
    err.into()
  }
}

/// ---------------------------------------------------------------------------
/// Stages
/// ---------------------------------------------------------------------------

/// Keep the first `days` days that have content, in week order, and empty the
/// rest. Returns the days that were emptied.
pub fn limit_training_days(schedule: &mut WeekSchedule, days: usize) -> Vec<Day> {
  let active = schedule.active_days();
  if active.len() < days {
    tracing::warn!(
      requested = days,
      generated = active.len(),
      "Generated plan has fewer training days than requested"
    );
  }

  let dropped: Vec<Day> = active.into_iter().skip(days).collect();
  for day in &dropped {
    schedule.day_mut(*day).clear();
  }
  if !dropped.is_empty() {
    tracing::info!(dropped = ?dropped, "Trimmed extra training days");
  }
  dropped
}

/// Classify, resolve volume and expand sets for every exercise
pub fn resolve_schedule(schedule: &mut WeekSchedule, catalog: &[ExerciseCatalogEntry], logs: &[RecentLogEntry]) {
  let by_name: HashMap<String, &ExerciseCatalogEntry> = catalog
    .iter()
    .map(|entry| (entry.name.trim().to_lowercase(), entry))
    .collect();

  for slot in schedule.exercises_mut() {
    let entry = by_name.get(&slot.name.trim().to_lowercase()).copied();
    resolve_exercise(slot, entry, logs);
  }
}

pub fn resolve_exercise(slot: &mut ExerciseSlot, entry: Option<&ExerciseCatalogEntry>, logs: &[RecentLogEntry]) {
  slot.movement_pattern = classify_movement(&slot.name);
  slot.tier = classify_tier(&slot.name);
  if entry.is_some_and(|e| e.is_timed) {
    slot.is_timed = true;
  }

  resolve_slot(slot);

  let duration = slot.is_timed.then(|| {
    slot
      .target_reps
      .seconds()
      .or_else(|| entry.and_then(|e| e.default_duration_sec))
      .filter(|s| *s > 0)
      .unwrap_or(DEFAULT_TIMED_DURATION_SEC)
  });
  if let Some(secs) = duration {
    slot.target_reps = RepTarget::Seconds(secs);
  }

  let weight = suggest_weight(&slot.name, logs);
  slot.expand_sets(duration, weight);
}

/// Most recent positive logged weight for the exercise, matched case-insensitively
pub fn suggest_weight(name: &str, logs: &[RecentLogEntry]) -> Option<f64> {
  let key = name.trim().to_lowercase();
  logs
    .iter()
    .filter(|log| log.weight.is_some_and(|w| w > 0.0))
    .filter(|log| log.exercise_name.trim().to_lowercase() == key)
    .max_by_key(|log| log.performed_at)
    .and_then(|log| log.weight)
}

fn compress_schedule(
  schedule: &mut WeekSchedule,
  target_minutes: u32,
  estimator: &dyn SetDurationEstimator,
) -> BTreeMap<Day, CompressionResult> {
  let mut results = BTreeMap::new();

  for day in schedule.active_days() {
    let exercises = std::mem::take(schedule.day_mut(day));
    let result = compress_day(exercises, Some(target_minutes), estimator);
    if result.compressed {
      tracing::info!(
        day = %day,
        actions = result.actions.len(),
        estimated_seconds = result.estimated_seconds,
        "Compressed day to fit duration target"
      );
    }
    schedule.set_day(day, result.exercises.clone());
    results.insert(day, result);
  }

  results
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
