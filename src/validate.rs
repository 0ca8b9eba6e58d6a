//! Week-schedule validation and normalization
//!
//! Turns an untrusted JSON value into a `WeekSchedule` with all seven days.
//! Only a missing schedule root is fatal. Everything else is repaired and
//! recorded as a `ValidationWarning`.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{Day, ExerciseSlot, RepTarget, RepairedFields, WeekSchedule};

pub const DEFAULT_SETS: u32 = 3;
pub const DEFAULT_REPS: u32 = 10;
pub const DEFAULT_REST_SEC: u32 = 60;

const ROOT_KEYS: [&str; 2] = ["week_schedule", "weekSchedule"];
const SETS_KEYS: [&str; 3] = ["target_sets", "targetSets", "sets"];
const REPS_KEYS: [&str; 3] = ["target_reps", "targetReps", "reps"];
const REST_KEYS: [&str; 3] = ["rest_time_sec", "restTimeSec", "rest"];

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
  #[error("Plan structure invalid: {0}")]
  StructureInvalid(String),
}

/// A repaired schema deviation. Logged, never surfaced as an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
  pub path: String,
  pub message: String,
}

impl ValidationWarning {
  fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      message: message.into(),
    }
  }
}

impl std::fmt::Display for ValidationWarning {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}: {}", self.path, self.message)
  }
}

#[derive(Debug, Clone)]
pub struct NormalizedPlan {
  pub schedule: WeekSchedule,
  pub warnings: Vec<ValidationWarning>,
}

/// ---------------------------------------------------------------------------
/// Normalization
/// ---------------------------------------------------------------------------

/// Validate and normalize a parsed plan.
///
/// Fails only when the value has no `week_schedule` object.
pub fn normalize_week(value: &Value) -> Result<NormalizedPlan, ValidationError> {
  let root = find_root(value)?;
  let mut warnings = Vec::new();
  let mut schedule = WeekSchedule::default();

  for (key, day_value) in root {
    let Some(day) = Day::from_key(key) else {
      warnings.push(ValidationWarning::new(
        format!("week_schedule.{}", key),
        "unknown day key dropped",
      ));
      continue;
    };

    let path = format!("week_schedule.{}", day);
    let exercises = normalize_day(day_value, &path, &mut warnings);
    schedule.day_mut(day).extend(exercises);
  }

  for warning in &warnings {
    tracing::debug!(path = %warning.path, "Repaired plan field: {}", warning.message);
  }

  Ok(NormalizedPlan { schedule, warnings })
}

fn find_root(value: &Value) -> Result<&Map<String, Value>, ValidationError> {
  let Some(obj) = value.as_object() else {
    return Err(ValidationError::StructureInvalid(
      "expected a JSON object at the top level".to_string(),
    ));
  };

  let root = ROOT_KEYS.iter().find_map(|k| obj.get(*k)).ok_or_else(|| {
    ValidationError::StructureInvalid("missing week_schedule".to_string())
  })?;

  root.as_object().ok_or_else(|| {
    ValidationError::StructureInvalid("week_schedule is not an object".to_string())
  })
}

fn normalize_day(value: &Value, path: &str, warnings: &mut Vec<ValidationWarning>) -> Vec<ExerciseSlot> {
  let items: &[Value] = match value {
    Value::Array(items) => items.as_slice(),
    Value::Object(obj) => match obj.get("exercises") {
      Some(Value::Array(items)) => items.as_slice(),
      _ => {
        warnings.push(ValidationWarning::new(path, "day object has no exercises array"));
        &[]
      }
    },
    Value::Null => &[],
    _ => {
      warnings.push(ValidationWarning::new(path, "day is not a list; replaced with an empty day"));
      &[]
    }
  };

  items
    .iter()
    .enumerate()
    .filter_map(|(i, item)| normalize_exercise(item, &format!("{}[{}]", path, i), warnings))
    .collect()
}

fn normalize_exercise(
  value: &Value,
  path: &str,
  warnings: &mut Vec<ValidationWarning>,
) -> Option<ExerciseSlot> {
  let Some(obj) = value.as_object() else {
    warnings.push(ValidationWarning::new(path, "exercise is not an object; removed"));
    return None;
  };

  let name = obj
    .get("name")
    .and_then(Value::as_str)
    .map(str::trim)
    .unwrap_or_default();
  if name.is_empty() {
    warnings.push(ValidationWarning::new(path, "exercise has no name; removed"));
    return None;
  }

  let mut repaired = RepairedFields::default();

  let target_sets = match lookup(obj, &SETS_KEYS).and_then(positive_int) {
    Some(sets) => sets,
    None => {
      repaired.sets = true;
      warnings.push(ValidationWarning::new(
        format!("{}.target_sets", path),
        format!("missing or invalid; set to {}", DEFAULT_SETS),
      ));
      DEFAULT_SETS
    }
  };

  let target_reps = match lookup(obj, &REPS_KEYS).and_then(rep_target) {
    Some(reps) => reps,
    None => {
      repaired.reps = true;
      warnings.push(ValidationWarning::new(
        format!("{}.target_reps", path),
        format!("missing or invalid; set to {}", DEFAULT_REPS),
      ));
      RepTarget::Count(DEFAULT_REPS)
    }
  };

  let rest_time_sec = match lookup(obj, &REST_KEYS) {
    None | Some(Value::Null) => {
      repaired.rest = true;
      DEFAULT_REST_SEC
    }
    Some(raw) => match non_negative_int(raw) {
      Some(rest) => rest,
      None => {
        repaired.rest = true;
        warnings.push(ValidationWarning::new(
          format!("{}.rest_time_sec", path),
          format!("negative or invalid; set to {}", DEFAULT_REST_SEC),
        ));
        DEFAULT_REST_SEC
      }
    },
  };

  let mut slot = ExerciseSlot::new(name, target_sets, target_reps);
  slot.rest_time_sec = rest_time_sec;
  slot.repaired = repaired;
  Some(slot)
}

fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
  keys.iter().find_map(|k| obj.get(*k))
}

/// Whole, non-negative number from a JSON number or numeric string
fn non_negative_int(value: &Value) -> Option<u32> {
  let n = match value {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => s.trim().parse::<f64>().ok()?,
    _ => return None,
  };
  (n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64).then_some(n as u32)
}

fn positive_int(value: &Value) -> Option<u32> {
  non_negative_int(value).filter(|n| *n > 0)
}

fn rep_target(value: &Value) -> Option<RepTarget> {
  match value {
    Value::String(s) => RepTarget::parse(s),
    other => positive_int(other).map(RepTarget::Count),
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
