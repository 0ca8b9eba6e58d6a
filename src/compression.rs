//! Day-level workload compression
//!
//! Shrinks a day's exercise list to fit a duration budget by applying an
//! ordered list of strategies. Strategies run in sequence, each at most
//! once, and the fold stops as soon as the running estimate fits. Earlier
//! strategies are never revisited and their effects are never undone.
//!
//! Compression never fails: an unreachable target returns the most-reduced
//! list together with its (still over-target) estimate.

use serde::{Deserialize, Serialize};

use crate::classify::is_unilateral;
use crate::models::{ExerciseSlot, MovementPattern, SetTarget, Tier};

/// Rest intervals are never shortened below this
pub const MIN_REST_SEC: u32 = 30;

/// Set floor for accessory and prehab exercises
pub const MIN_SETS_ANY: u32 = 2;

/// Set floor for compound exercises
pub const MIN_SETS_COMPOUND: u32 = 3;

/// Setup time handed to the estimator for each exercise's first set
pub const SETUP_BUFFER_SEC: f64 = 20.0;

// ---------------------------------------------------------------------------
/// Duration Estimation
// ---------------------------------------------------------------------------

/// Parameters for one rep-based set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetEstimateInput {
    pub target_sets: u32,
    pub target_reps: u32,
    pub pattern: MovementPattern,
    /// Seconds per rep
    pub tempo_sec_per_rep: f64,
    pub setup_buffer_sec: f64,
    pub unilateral: bool,
    /// Position of the exercise within the day (0 = first)
    pub sequence_position: usize,
    pub set_index: u32,
}

/// Execution-time estimate for a rep-based set, rest excluded
pub trait SetDurationEstimator: Send + Sync {
    fn estimate_execution_secs(&self, input: &SetEstimateInput) -> f64;
}

/// Default tempo for a pattern, seconds per rep
pub fn tempo_for(pattern: MovementPattern) -> f64 {
    match pattern {
        MovementPattern::Squat | MovementPattern::Hinge | MovementPattern::Lunge => 4.0,
        _ => 3.0,
    }
}

/// reps x tempo, doubled for unilateral work, plus setup on the first set
/// and a warm-up allowance before the first exercise of the day
#[derive(Debug, Clone, Copy)]
pub struct TempoEstimator {
    pub warmup_buffer_sec: f64,
}

impl Default for TempoEstimator {
    fn default() -> Self {
        Self {
            warmup_buffer_sec: 60.0,
        }
    }
}

impl SetDurationEstimator for TempoEstimator {
    fn estimate_execution_secs(&self, input: &SetEstimateInput) -> f64 {
        let sides = if input.unilateral { 2.0 } else { 1.0 };
        let mut secs = input.target_reps as f64 * input.tempo_sec_per_rep * sides;

        if input.set_index == 0 {
            secs += input.setup_buffer_sec;
            if input.sequence_position == 0 {
                secs += self.warmup_buffer_sec;
            }
        }

        secs
    }
}

/// Estimated seconds for one exercise: execution plus rest for every set
fn estimate_exercise_secs(
    slot: &ExerciseSlot,
    position: usize,
    estimator: &dyn SetDurationEstimator,
) -> f64 {
    let unilateral = is_unilateral(&slot.name);
    let fallback_reps = slot.target_reps.rep_count().unwrap_or(1);

    slot.sets
        .iter()
        .map(|set| {
            let execution = match set.target {
                SetTarget::DurationSec(secs) => secs as f64,
                SetTarget::Reps(reps) => estimator.estimate_execution_secs(&SetEstimateInput {
                    target_sets: slot.target_sets,
                    target_reps: if reps > 0 { reps } else { fallback_reps },
                    pattern: slot.movement_pattern,
                    tempo_sec_per_rep: tempo_for(slot.movement_pattern),
                    setup_buffer_sec: SETUP_BUFFER_SEC,
                    unilateral,
                    sequence_position: position,
                    set_index: set.index,
                }),
            };
            execution + set.rest_time_sec as f64
        })
        .sum()
}

/// Estimated seconds for a whole day
pub fn estimate_day_secs(exercises: &[ExerciseSlot], estimator: &dyn SetDurationEstimator) -> u32 {
    let total: f64 = exercises
        .iter()
        .enumerate()
        .map(|(position, slot)| estimate_exercise_secs(slot, position, estimator))
        .sum();
    total.round() as u32
}

// ---------------------------------------------------------------------------
/// Strategies
// ---------------------------------------------------------------------------

/// One irreversible transform; returns the action taken, or None when it
/// had nothing to change
struct Strategy {
    apply: fn(&mut Vec<ExerciseSlot>) -> Option<String>,
}

const STRATEGIES: [Strategy; 5] = [
    Strategy { apply: shorten_rest },
    Strategy { apply: trim_secondary_sets },
    Strategy { apply: drop_prehab },
    Strategy { apply: trim_compound_sets },
    Strategy { apply: keep_compounds_only },
];

fn reduced_rest(rest: u32) -> u32 {
    if rest <= MIN_REST_SEC {
        rest
    } else {
        ((rest as f64 * 0.8).round() as u32).max(MIN_REST_SEC)
    }
}

fn shorten_rest(exercises: &mut Vec<ExerciseSlot>) -> Option<String> {
    let mut changed = false;
    for slot in exercises.iter_mut() {
        let rest = reduced_rest(slot.rest_time_sec);
        changed |= rest != slot.rest_time_sec;
        slot.rest_time_sec = rest;
        for set in slot.sets.iter_mut() {
            let rest = reduced_rest(set.rest_time_sec);
            changed |= rest != set.rest_time_sec;
            set.rest_time_sec = rest;
        }
    }
    changed.then(|| format!("Reduced rest intervals by 20% (minimum {}s)", MIN_REST_SEC))
}

fn trim_sets_where(
    exercises: &mut [ExerciseSlot],
    floor: u32,
    include: impl Fn(Tier) -> bool,
) -> Vec<String> {
    let mut trimmed = Vec::new();
    for slot in exercises.iter_mut() {
        if include(slot.tier) && slot.target_sets > floor {
            slot.truncate_sets(slot.target_sets - 1);
            trimmed.push(slot.name.clone());
        }
    }
    trimmed
}

fn trim_secondary_sets(exercises: &mut Vec<ExerciseSlot>) -> Option<String> {
    let trimmed = trim_sets_where(exercises, MIN_SETS_ANY, |t| t != Tier::Compound);
    (!trimmed.is_empty()).then(|| {
        format!(
            "Removed one set from accessory/prehab exercises: {}",
            trimmed.join(", ")
        )
    })
}

fn drop_prehab(exercises: &mut Vec<ExerciseSlot>) -> Option<String> {
    let removed: Vec<String> = exercises
        .iter()
        .filter(|s| s.tier == Tier::Prehab)
        .map(|s| s.name.clone())
        .collect();
    if removed.is_empty() {
        return None;
    }
    exercises.retain(|s| s.tier != Tier::Prehab);
    Some(format!("Removed prehab/mobility exercises: {}", removed.join(", ")))
}

fn trim_compound_sets(exercises: &mut Vec<ExerciseSlot>) -> Option<String> {
    let trimmed = trim_sets_where(exercises, MIN_SETS_COMPOUND, |t| t == Tier::Compound);
    (!trimmed.is_empty()).then(|| {
        format!("Removed one set from compound exercises: {}", trimmed.join(", "))
    })
}

fn keep_compounds_only(exercises: &mut Vec<ExerciseSlot>) -> Option<String> {
    // Skipped on days with no compound so they are never emptied. Whether
    // such a day should be cleared instead is still an open product question.
    if !exercises.iter().any(|s| s.tier == Tier::Compound) {
        return None;
    }
    let removed: Vec<String> = exercises
        .iter()
        .filter(|s| s.tier != Tier::Compound)
        .map(|s| s.name.clone())
        .collect();
    if removed.is_empty() {
        return None;
    }
    exercises.retain(|s| s.tier == Tier::Compound);
    Some(format!("Removed accessory exercises: {}", removed.join(", ")))
}

// ---------------------------------------------------------------------------
/// Compression
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionResult {
    pub exercises: Vec<ExerciseSlot>,
    pub estimated_seconds: u32,
    pub target_seconds: Option<u32>,
    pub compressed: bool,
    pub actions: Vec<String>,
}

impl CompressionResult {
    pub fn within_target(&self) -> bool {
        self.target_seconds
            .is_none_or(|target| self.estimated_seconds <= target)
    }
}

/// Fit a day's exercises into `target_minutes`
pub fn compress_day(
    exercises: Vec<ExerciseSlot>,
    target_minutes: Option<u32>,
    estimator: &dyn SetDurationEstimator,
) -> CompressionResult {
    let estimated_seconds = estimate_day_secs(&exercises, estimator);
    let target_seconds = target_minutes.map(|m| m.saturating_mul(60));

    let Some(target) = target_seconds else {
        return CompressionResult {
            exercises,
            estimated_seconds,
            target_seconds,
            compressed: false,
            actions: Vec::new(),
        };
    };

    let initial = CompressionResult {
        exercises,
        estimated_seconds,
        target_seconds,
        compressed: false,
        actions: Vec::new(),
    };

    let result = STRATEGIES.iter().fold(initial, |mut state, strategy| {
        if state.estimated_seconds <= target {
            return state;
        }
        if let Some(action) = (strategy.apply)(&mut state.exercises) {
            state.estimated_seconds = estimate_day_secs(&state.exercises, estimator);
            tracing::debug!(
                action = %action,
                estimated_seconds = state.estimated_seconds,
                target_seconds = target,
                "Applied compression strategy"
            );
            state.actions.push(action);
            state.compressed = true;
        }
        state
    });

    if !result.within_target() {
        tracing::warn!(
            estimated_seconds = result.estimated_seconds,
            target_seconds = target,
            "Day still over duration target after all compression strategies"
        );
    }

    result
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
