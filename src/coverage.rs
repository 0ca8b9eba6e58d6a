//! Movement-pattern coverage analysis
//!
//! Compares how many sets each pattern gets in the proposed week against the
//! trailing log windows. Purely advisory: the result feeds prompt text and
//! optional UI hints and never edits a schedule.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::classify::classify_movement;
use crate::models::{MovementPattern, RecentLogEntry, WeekSchedule};

/// Fewer sets than this in the current week is under-served
pub const UNDER_SERVED_SETS: u32 = 3;

/// More sets than this in the current week is over-served
pub const OVER_SERVED_SETS: u32 = 15;

/// Patterns a balanced week should never skip entirely
pub const ESSENTIAL_PATTERNS: [MovementPattern; 4] = [
  MovementPattern::Squat,
  MovementPattern::Hinge,
  MovementPattern::PushHoriz,
  MovementPattern::PullHoriz,
];

/// ---------------------------------------------------------------------------
/// Result Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternCoverage {
  pub this_week_sets: u32,
  pub last_week_sets: u32,
  pub last_two_weeks_sets: u32,
  pub last_worked: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageAnalysisResult {
  pub patterns: BTreeMap<MovementPattern, PatternCoverage>,
  pub under_served: Vec<MovementPattern>,
  pub over_served: Vec<MovementPattern>,
  pub missing_essentials: Vec<MovementPattern>,
  pub recommendations: Vec<String>,
}

impl CoverageAnalysisResult {
  /// Analyze coverage.
  ///
  /// With a proposed schedule, "this week" is the schedule's planned sets.
  /// Without one, the trailing 7-day log window stands in for it.
  pub fn compute(
    schedule: Option<&WeekSchedule>,
    logs: &[RecentLogEntry],
    now: DateTime<Utc>,
  ) -> Self {
    let mut patterns: BTreeMap<MovementPattern, PatternCoverage> = MovementPattern::TRACKED
      .into_iter()
      .map(|p| (p, PatternCoverage::default()))
      .collect();

    for entry in logs {
      let pattern = classify_movement(&entry.exercise_name);
      let Some(coverage) = patterns.get_mut(&pattern) else {
        continue;
      };

      let age = now - entry.performed_at;
      if age < Duration::zero() {
        continue;
      }
      if age < Duration::days(7) {
        coverage.last_week_sets += 1;
      }
      if age < Duration::days(14) {
        coverage.last_two_weeks_sets += 1;
      }
      if coverage.last_worked.is_none_or(|last| entry.performed_at > last) {
        coverage.last_worked = Some(entry.performed_at);
      }
    }

    match schedule {
      Some(schedule) => {
        for (_, exercises) in schedule.iter() {
          for slot in exercises {
            let pattern = if slot.movement_pattern == MovementPattern::Unknown {
              classify_movement(&slot.name)
            } else {
              slot.movement_pattern
            };
            if let Some(coverage) = patterns.get_mut(&pattern) {
              coverage.this_week_sets += slot.target_sets;
            }
          }
        }
      }
      None => {
        for coverage in patterns.values_mut() {
          coverage.this_week_sets = coverage.last_week_sets;
        }
      }
    }

    let mut result = Self {
      patterns,
      ..Self::default()
    };
    result.flag_imbalances();
    result.recommendations = result.build_recommendations();
    result
  }

  fn flag_imbalances(&mut self) {
    let total: u32 = self.patterns.values().map(|c| c.this_week_sets).sum();
    let average = total as f64 / MovementPattern::TRACKED.len() as f64;

    for (pattern, coverage) in &self.patterns {
      let sets = coverage.this_week_sets;
      if sets < UNDER_SERVED_SETS {
        self.under_served.push(*pattern);
      }
      if sets > OVER_SERVED_SETS || (average > 0.0 && sets as f64 > 2.0 * average) {
        self.over_served.push(*pattern);
      }
    }

    self.missing_essentials = ESSENTIAL_PATTERNS
      .into_iter()
      .filter(|p| self.patterns.get(p).is_none_or(|c| c.this_week_sets == 0))
      .collect();
  }

  fn build_recommendations(&self) -> Vec<String> {
    let mut recs = Vec::new();

    if !self.missing_essentials.is_empty() {
      let names: Vec<&str> = self.missing_essentials.iter().map(|p| p.as_str()).collect();
      recs.push(format!(
        "Essential patterns with zero sets this week: {}. Include at least one exercise for each.",
        names.join(", ")
      ));
    }

    for pattern in &self.under_served {
      if self.missing_essentials.contains(pattern) {
        continue;
      }
      let coverage = &self.patterns[pattern];
      recs.push(format!(
        "{} is under-served ({} sets this week, {} last week); aim for at least {}.",
        pattern, coverage.this_week_sets, coverage.last_week_sets, UNDER_SERVED_SETS
      ));
    }

    for pattern in &self.over_served {
      let coverage = &self.patterns[pattern];
      recs.push(format!(
        "{} is over-served ({} sets this week); shift some volume to other patterns.",
        pattern, coverage.this_week_sets
      ));
    }

    recs
  }

  pub fn is_balanced(&self) -> bool {
    self.under_served.is_empty() && self.over_served.is_empty()
  }

  /// Prompt section listing per-pattern volume and the recommendations
  pub fn to_prompt_section(&self) -> String {
    let mut out = String::from("MOVEMENT PATTERN COVERAGE (sets this week / last 7 days / last 14 days):\n");
    for (pattern, coverage) in &self.patterns {
      let last = coverage
        .last_worked
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "never".to_string());
      out.push_str(&format!(
        "- {}: {} / {} / {} (last worked {})\n",
        pattern, coverage.this_week_sets, coverage.last_week_sets, coverage.last_two_weeks_sets, last
      ));
    }
    if !self.recommendations.is_empty() {
      out.push_str("Coverage recommendations:\n");
      for rec in &self.recommendations {
        out.push_str(&format!("- {}\n", rec));
      }
    }
    out
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{Day, ExerciseSlot, RepTarget};

  fn log(name: &str, days_ago: i64, now: DateTime<Utc>) -> RecentLogEntry {
    RecentLogEntry {
      exercise_name: name.to_string(),
      performed_at: now - Duration::days(days_ago),
      weight: Some(60.0),
      reps: Some(8),
    }
  }

  fn slot(name: &str, sets: u32) -> ExerciseSlot {
    ExerciseSlot::new(name, sets, RepTarget::Count(8))
  }

  #[test]
  fn test_counts_schedule_and_log_windows() {
    let now = Utc::now();
    let mut schedule = WeekSchedule::default();
    schedule.set_day(Day::Monday, vec![slot("Back Squat", 4), slot("Bench Press", 3)]);
    schedule.set_day(Day::Thursday, vec![slot("Front Squat", 3)]);

    let logs = vec![
      log("Back Squat", 2, now),
      log("Back Squat", 2, now),
      log("Back Squat", 10, now),
      log("Deadlift", 20, now),
    ];

    let result = CoverageAnalysisResult::compute(Some(&schedule), &logs, now);
    let squat = &result.patterns[&MovementPattern::Squat];

    assert_eq!(squat.this_week_sets, 7);
    assert_eq!(squat.last_week_sets, 2);
    assert_eq!(squat.last_two_weeks_sets, 3);
    assert_eq!(squat.last_worked, Some(now - Duration::days(2)));

    let hinge = &result.patterns[&MovementPattern::Hinge];
    assert_eq!(hinge.last_two_weeks_sets, 0);
    assert_eq!(hinge.last_worked, Some(now - Duration::days(20)));
  }

  #[test]
  fn test_missing_essentials_called_out() {
    let now = Utc::now();
    let mut schedule = WeekSchedule::default();
    schedule.set_day(Day::Monday, vec![slot("Back Squat", 4), slot("Bench Press", 4)]);

    let result = CoverageAnalysisResult::compute(Some(&schedule), &[], now);

    assert_eq!(
      result.missing_essentials,
      vec![MovementPattern::Hinge, MovementPattern::PullHoriz]
    );
    assert!(result.recommendations[0].contains("hinge, pull_horiz"));
    assert!(result.under_served.contains(&MovementPattern::Carry));
    assert!(!result.is_balanced());
  }

  #[test]
  fn test_over_served_by_absolute_and_relative_thresholds() {
    let now = Utc::now();
    let mut schedule = WeekSchedule::default();
    schedule.set_day(
      Day::Monday,
      vec![slot("Bench Press", 5), slot("Push-Up", 5), slot("Dumbbell Fly", 4)],
    );
    schedule.set_day(Day::Wednesday, vec![slot("Bench Press", 5), slot("Barbell Row", 3)]);

    let result = CoverageAnalysisResult::compute(Some(&schedule), &[], now);

    // 19 push_horiz sets > 15
    assert!(result.over_served.contains(&MovementPattern::PushHoriz));
    assert!(!result.over_served.contains(&MovementPattern::PullHoriz));
    assert!(result.recommendations.iter().any(|r| r.starts_with("push_horiz is over-served")));
  }

  #[test]
  fn test_relative_over_served_below_absolute_limit() {
    let now = Utc::now();
    let mut schedule = WeekSchedule::default();
    schedule.set_day(Day::Monday, vec![slot("Back Squat", 5), slot("Barbell Row", 3)]);

    // average = 8 / 8 = 1.0, squat 5 > 2.0
    let result = CoverageAnalysisResult::compute(Some(&schedule), &[], now);
    assert!(result.over_served.contains(&MovementPattern::Squat));
    assert!(result.over_served.contains(&MovementPattern::PullHoriz));
  }

  #[test]
  fn test_without_schedule_uses_last_week_logs() {
    let now = Utc::now();
    let logs: Vec<RecentLogEntry> = (0..4).map(|_| log("Romanian Deadlift", 1, now)).collect();

    let result = CoverageAnalysisResult::compute(None, &logs, now);
    assert_eq!(result.patterns[&MovementPattern::Hinge].this_week_sets, 4);
    assert!(!result.under_served.contains(&MovementPattern::Hinge));
  }

  #[test]
  fn test_analysis_does_not_touch_schedule() {
    let now = Utc::now();
    let mut schedule = WeekSchedule::default();
    schedule.set_day(Day::Friday, vec![slot("Deadlift", 3)]);
    let before = schedule.clone();

    let _ = CoverageAnalysisResult::compute(Some(&schedule), &[], now);
    assert_eq!(schedule, before);
  }

  #[test]
  fn test_prompt_section_lists_all_patterns() {
    let result = CoverageAnalysisResult::compute(None, &[], Utc::now());
    let section = result.to_prompt_section();
    for pattern in MovementPattern::TRACKED {
      assert!(section.contains(pattern.as_str()));
    }
    assert!(section.contains("Coverage recommendations"));
  }
}
