//! Per-pattern recovery windows
//!
//! Key principles:
//! - Only heavy sets (positive load, 1-8 reps) start a recovery window
//! - Each pattern has its own minimum window (hinges recover slowest)
//! - Findings are advisory and never block plan generation

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::classify::classify_movement;
use crate::models::{Day, ExerciseSlot, MovementPattern, RecentLogEntry, WeekSchedule};

/// Minimum hours between heavy sessions of the same pattern
pub fn min_recovery_hours(pattern: MovementPattern) -> u32 {
    match pattern {
        MovementPattern::Hinge => 72,
        MovementPattern::Squat
        | MovementPattern::Lunge
        | MovementPattern::PushVert
        | MovementPattern::PushHoriz
        | MovementPattern::PullVert
        | MovementPattern::PullHoriz => 48,
        MovementPattern::Carry | MovementPattern::Unknown => 24,
    }
}

/// A planned slot counts as heavy when it is rep-based with 1-8 reps
pub fn is_heavy_slot(slot: &ExerciseSlot) -> bool {
    !slot.is_timed
        && slot
            .target_reps
            .rep_count()
            .is_some_and(|r| (1..=8).contains(&r))
}

// ---------------------------------------------------------------------------
/// Recovery State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryState {
    pub pattern: MovementPattern,
    pub last_heavy_at: Option<DateTime<Utc>>,
    pub hours_elapsed: Option<f64>,
    pub recovered: bool,
    pub min_recovery_hours: u32,
}

impl RecoveryState {
    fn fresh(pattern: MovementPattern) -> Self {
        Self {
            pattern,
            last_heavy_at: None,
            hours_elapsed: None,
            recovered: true,
            min_recovery_hours: min_recovery_hours(pattern),
        }
    }

    /// Hours still needed at `offset_hours` from the analysis time
    fn hours_remaining_after(&self, offset_hours: f64) -> f64 {
        match self.hours_elapsed {
            Some(elapsed) => (self.min_recovery_hours as f64 - (elapsed + offset_hours)).max(0.0),
            None => 0.0,
        }
    }

    fn required_days(&self) -> u32 {
        self.min_recovery_hours.div_ceil(24)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConflict {
    pub day: Day,
    pub exercise: String,
    pub pattern: MovementPattern,
    pub hours_remaining: f64,
}

/// Result of a schedulability check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedulability {
    pub schedulable: bool,
    pub pattern: MovementPattern,
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
/// Recovery Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryReport {
    pub analyzed_at: DateTime<Utc>,
    pub states: BTreeMap<MovementPattern, RecoveryState>,
    pub conflicts: Vec<RecoveryConflict>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl RecoveryReport {
    /// Compute recovery states from the log window, and conflicts if a
    /// proposed schedule is given
    pub fn compute(
        logs: &[RecentLogEntry],
        proposed: Option<&WeekSchedule>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut states: BTreeMap<MovementPattern, RecoveryState> = MovementPattern::TRACKED
            .into_iter()
            .chain([MovementPattern::Unknown])
            .map(|p| (p, RecoveryState::fresh(p)))
            .collect();

        for entry in logs.iter().filter(|e| e.is_heavy() && e.performed_at <= now) {
            let pattern = classify_movement(&entry.exercise_name);
            let state = states
                .entry(pattern)
                .or_insert_with(|| RecoveryState::fresh(pattern));
            if state.last_heavy_at.is_none_or(|last| entry.performed_at > last) {
                state.last_heavy_at = Some(entry.performed_at);
            }
        }

        let mut warnings = Vec::new();
        for state in states.values_mut() {
            if let Some(last) = state.last_heavy_at {
                let elapsed = (now - last).num_minutes() as f64 / 60.0;
                state.hours_elapsed = Some(elapsed);
                state.recovered = elapsed >= state.min_recovery_hours as f64;
                if !state.recovered {
                    warnings.push(format!(
                        "{} still recovering: last heavy session {:.0}h ago, needs {}h",
                        state.pattern, elapsed, state.min_recovery_hours
                    ));
                }
            }
        }

        let mut report = Self {
            analyzed_at: now,
            states,
            conflicts: Vec::new(),
            warnings,
            recommendations: Vec::new(),
        };

        if let Some(schedule) = proposed {
            report.find_conflicts(schedule);
        }

        report
    }

    fn find_conflicts(&mut self, schedule: &WeekSchedule) {
        let today = self.analyzed_at.weekday().num_days_from_monday();

        for (day, exercises) in schedule.iter() {
            let offset_days = (day.weekday().num_days_from_monday() + 7 - today) % 7;
            let offset_hours = offset_days as f64 * 24.0;

            for slot in exercises.iter().filter(|s| is_heavy_slot(s)) {
                let pattern = self.pattern_of(slot);
                let Some(state) = self.states.get(&pattern) else {
                    continue;
                };
                let remaining = state.hours_remaining_after(offset_hours);
                if remaining > 0.0 {
                    self.conflicts.push(RecoveryConflict {
                        day,
                        exercise: slot.name.clone(),
                        pattern,
                        hours_remaining: remaining,
                    });
                }
            }
        }

        for conflict in &self.conflicts {
            let state = &self.states[&conflict.pattern];
            self.warnings.push(format!(
                "Heavy {} work on {} ({}) falls inside the {}h recovery window",
                conflict.pattern, conflict.day, conflict.exercise, state.min_recovery_hours
            ));
            self.recommendations.push(format!(
                "Move {} off {} or keep it light (more than 8 reps): {} needs {} days of recovery ({:.0}h remaining)",
                conflict.exercise,
                conflict.day,
                conflict.pattern,
                state.required_days(),
                conflict.hours_remaining
            ));
        }
    }

    fn pattern_of(&self, slot: &ExerciseSlot) -> MovementPattern {
        if slot.movement_pattern == MovementPattern::Unknown {
            classify_movement(&slot.name)
        } else {
            slot.movement_pattern
        }
    }

    /// Can a heavy set of `exercise_name` be trained at analysis time?
    pub fn check_schedulable(&self, exercise_name: &str) -> Schedulability {
        let pattern = classify_movement(exercise_name);
        let Some(state) = self.states.get(&pattern) else {
            return Schedulability {
                schedulable: true,
                pattern,
                reason: None,
            };
        };

        if state.recovered {
            return Schedulability {
                schedulable: true,
                pattern,
                reason: None,
            };
        }

        Schedulability {
            schedulable: false,
            pattern,
            reason: Some(format!(
                "{} pattern needs {} days ({}h) of recovery; last heavy session was {:.0}h ago",
                pattern,
                state.required_days(),
                state.min_recovery_hours,
                state.hours_elapsed.unwrap_or(0.0)
            )),
        }
    }

    pub fn is_schedulable(&self, exercise_name: &str) -> bool {
        self.check_schedulable(exercise_name).schedulable
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Prompt section naming patterns that are still recovering
    pub fn to_prompt_section(&self) -> String {
        let recovering: Vec<&RecoveryState> =
            self.states.values().filter(|s| !s.recovered).collect();

        if recovering.is_empty() && self.recommendations.is_empty() {
            return "RECOVERY: all movement patterns recovered.\n".to_string();
        }

        let mut out = String::from("RECOVERY (avoid heavy work for these patterns until recovered):\n");
        for state in recovering {
            out.push_str(&format!(
                "- {}: last heavy {:.0}h ago, needs {}h\n",
                state.pattern,
                state.hours_elapsed.unwrap_or(0.0),
                state.min_recovery_hours
            ));
        }
        for rec in &self.recommendations {
            out.push_str(&format!("- {}\n", rec));
        }
        out
    }
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
