//! Volume template resolution
//!
//! Each exercise lands in a volume category with its own defaults and
//! [min, max] bounds for sets, reps and rest. Provided values win when they
//! are positive, then everything is clamped, so the output never carries a
//! missing value and re-resolving an output changes nothing.

use serde::{Deserialize, Serialize};

use crate::classify::{first_match, KeywordRule};
use crate::models::{ExerciseSlot, RepTarget};
#[cfg(test)]
use crate::models::RepairedFields;

/// ---------------------------------------------------------------------------
/// Categories
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeCategory {
  CompoundUpper,
  CompoundLower,
  Accessory,
  CalfCore,
  Cardio,
  Generic,
}

/// Inclusive bounds plus the defaults used when nothing usable was provided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VolumeTemplate {
  pub sets: (u32, u32),
  pub reps: (u32, u32),
  pub rest_sec: (u32, u32),
  pub default_sets: u32,
  pub default_reps: u32,
  pub default_rest_sec: u32,
}

impl VolumeCategory {
  pub fn template(&self) -> VolumeTemplate {
    match self {
      VolumeCategory::CompoundUpper => VolumeTemplate {
        sets: (3, 5),
        reps: (3, 8),
        rest_sec: (90, 210),
        default_sets: 4,
        default_reps: 6,
        default_rest_sec: 150,
      },
      VolumeCategory::CompoundLower => VolumeTemplate {
        sets: (3, 5),
        reps: (3, 8),
        rest_sec: (90, 210),
        default_sets: 4,
        default_reps: 5,
        default_rest_sec: 180,
      },
      VolumeCategory::Accessory => VolumeTemplate {
        sets: (2, 4),
        reps: (8, 15),
        rest_sec: (45, 90),
        default_sets: 3,
        default_reps: 12,
        default_rest_sec: 60,
      },
      VolumeCategory::CalfCore => VolumeTemplate {
        sets: (3, 5),
        reps: (10, 20),
        rest_sec: (30, 75),
        default_sets: 3,
        default_reps: 15,
        default_rest_sec: 45,
      },
      VolumeCategory::Cardio => VolumeTemplate {
        sets: (1, 4),
        reps: (1, 5),
        rest_sec: (30, 90),
        default_sets: 1,
        default_reps: 1,
        default_rest_sec: 60,
      },
      VolumeCategory::Generic => VolumeTemplate {
        sets: (2, 5),
        reps: (5, 15),
        rest_sec: (45, 180),
        default_sets: 3,
        default_reps: 10,
        default_rest_sec: 90,
      },
    }
  }
}

/// Cardio and calf/core are checked before the strength categories, and
/// accessories before compounds so "Leg Curl" and "Upright Row" stay small
pub const VOLUME_RULES: &[KeywordRule<VolumeCategory>] = &[
  KeywordRule {
    keywords: &[
      "run", "jog", "sprint", "bike", "cycl", "rowing", "row erg", "erg", "treadmill",
      "elliptical", "jump rope", "skipping", "burpee", "swim", "stair", "jumping jack", "assault",
      "sled", "hiit", "cardio", "interval",
    ],
    result: VolumeCategory::Cardio,
  },
  KeywordRule {
    keywords: &[
      "calf", "calves", "plank", "crunch", "sit up", "situp", "leg raise", "abs", "ab wheel",
      "core", "russian twist", "dead bug", "hollow", "pallof", "oblique", "v up", "toe raise",
      "bird dog", "mountain climber", "side bend", "woodchop",
    ],
    result: VolumeCategory::CalfCore,
  },
  KeywordRule {
    keywords: &[
      "curl", "extension", "kickback", "pushdown", "raise", "fly", "flye", "shrug", "face pull",
      "pec deck", "upright row", "pullover", "skull crusher", "adduct", "abduct", "rear delt",
      "tricep", "bicep", "crossover",
    ],
    result: VolumeCategory::Accessory,
  },
  KeywordRule {
    keywords: &[
      "squat", "deadlift", "rdl", "lunge", "leg press", "hip thrust", "step up", "good morning",
      "bulgarian", "clean", "snatch", "glute bridge", "hack",
    ],
    result: VolumeCategory::CompoundLower,
  },
  KeywordRule {
    keywords: &[
      "bench", "press", "row", "pull up", "pullup", "chin up", "chinup", "pulldown", "dip",
      "push up", "pushup", "muscle up",
    ],
    result: VolumeCategory::CompoundUpper,
  },
];

pub fn classify_volume(name: &str) -> VolumeCategory {
  first_match(VOLUME_RULES, name).unwrap_or(VolumeCategory::Generic)
}

/// ---------------------------------------------------------------------------
/// Resolution
/// ---------------------------------------------------------------------------

/// Whatever the model or template provided; any field may be absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeRequest {
  pub sets: Option<u32>,
  pub reps: Option<u32>,
  pub rest_sec: Option<u32>,
}

/// Fully resolved prescription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedVolume {
  pub category: VolumeCategory,
  pub sets: u32,
  pub reps: u32,
  pub rest_sec: u32,
}

impl ResolvedVolume {
  pub fn as_request(&self) -> VolumeRequest {
    VolumeRequest {
      sets: Some(self.sets),
      reps: Some(self.reps),
      rest_sec: Some(self.rest_sec),
    }
  }
}

fn pick(provided: Option<u32>, default: u32, (min, max): (u32, u32)) -> u32 {
  provided.filter(|v| *v > 0).unwrap_or(default).clamp(min, max)
}

/// Resolve sets/reps/rest for an exercise name
pub fn resolve_volume(name: &str, request: VolumeRequest) -> ResolvedVolume {
  let category = classify_volume(name);
  let t = category.template();

  ResolvedVolume {
    category,
    sets: pick(request.sets, t.default_sets, t.sets),
    reps: pick(request.reps, t.default_reps, t.reps),
    rest_sec: pick(request.rest_sec, t.default_rest_sec, t.rest_sec),
  }
}

/// Resolve a slot in place. Timed slots keep their duration target; only
/// sets and rest are resolved for them. Fields the normalizer repaired are
/// treated as absent so the category default applies.
pub fn resolve_slot(slot: &mut ExerciseSlot) -> ResolvedVolume {
  let repaired = std::mem::take(&mut slot.repaired);
  let resolved = resolve_volume(
    &slot.name,
    VolumeRequest {
      sets: (!repaired.sets).then_some(slot.target_sets),
      reps: if repaired.reps { None } else { slot.target_reps.rep_count() },
      rest_sec: (!repaired.rest).then_some(slot.rest_time_sec),
    },
  );

  slot.target_sets = resolved.sets;
  slot.rest_time_sec = resolved.rest_sec;
  if !slot.is_timed {
    slot.target_reps = RepTarget::Count(resolved.reps);
  }

  resolved
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
