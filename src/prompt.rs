//! Prompt construction for plan generation

use std::collections::HashSet;

use crate::coverage::CoverageAnalysisResult;
use crate::models::{MissedWorkout, UserProfile};
use crate::recovery::RecoveryReport;

pub const PLANNER_SYSTEM_PROMPT: &str = include_str!("prompts/planner_system.txt");

/// Everything the user prompt is built from
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
  pub profile: &'a UserProfile,
  pub duration_target_min: Option<u32>,
  pub exercise_names: &'a [String],
  pub missed_workouts: &'a [MissedWorkout],
  pub coverage: &'a CoverageAnalysisResult,
  pub recovery: &'a RecoveryReport,
}

/// Shared catalog names followed by user-authored ones, first spelling wins
pub fn merge_exercise_names(catalog: &[String], custom: &[String]) -> Vec<String> {
  let mut seen = HashSet::new();
  catalog
    .iter()
    .chain(custom)
    .map(|name| name.trim())
    .filter(|name| !name.is_empty() && seen.insert(name.to_lowercase()))
    .map(str::to_string)
    .collect()
}

pub fn build_plan_prompt(ctx: &PromptContext<'_>) -> String {
  let mut out = String::from("Create next week's training plan.\n\n");

  out.push_str(&format_profile(ctx.profile));

  match ctx.duration_target_min {
    Some(minutes) => out.push_str(&format!("Session duration target: {} minutes\n", minutes)),
    None => out.push_str("Session duration target: none\n"),
  }

  out.push_str("\nAVAILABLE EXERCISES:\n");
  if ctx.exercise_names.is_empty() {
    out.push_str("- (none listed; choose common exercises for the equipment)\n");
  }
  for name in ctx.exercise_names {
    out.push_str(&format!("- {}\n", name));
  }

  if !ctx.missed_workouts.is_empty() {
    out.push_str("\nMISSED WORKOUTS:\n");
    for missed in ctx.missed_workouts {
      out.push_str(&format!("- {} ({})\n", missed.title, missed.scheduled_for.format("%Y-%m-%d")));
    }
  }

  out.push('\n');
  out.push_str(&ctx.coverage.to_prompt_section());
  out.push('\n');
  out.push_str(&ctx.recovery.to_prompt_section());

  out.push_str(&format!(
    r#"
Respond with valid JSON only, exactly in this shape:
{{"week_schedule": {{"monday": [{{"name": "...", "target_sets": 3, "target_reps": "8-12", "rest_time_sec": 90}}], "tuesday": [], "wednesday": [], "thursday": [], "friday": [], "saturday": [], "sunday": []}}}}
Use exactly {} training days."#,
    ctx.profile.training_days()
  ));

  out
}

fn format_profile(profile: &UserProfile) -> String {
  format!(
    "ATHLETE PROFILE:\n- Age: {}\n- Gender: {}\n- Weight: {:.1} kg\n- Height: {:.0} cm\n- Goal: {}\n- Training days per week: {}\n- Equipment: {}\n",
    profile.age,
    profile.gender,
    profile.weight_kg,
    profile.height_cm,
    profile.goal,
    profile.training_days(),
    profile.equipment_access
  )
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{NaiveDate, Utc};

  #[test]
  fn test_merge_exercise_names_dedupes_case_insensitively() {
    let catalog = vec!["Back Squat".to_string(), "Bench Press".to_string()];
    let custom = vec!["back squat".to_string(), "  ".to_string(), "Sled Push".to_string()];

    let merged = merge_exercise_names(&catalog, &custom);

    assert_eq!(merged, vec!["Back Squat", "Bench Press", "Sled Push"]);
  }

  #[test]
  fn test_system_prompt_carries_output_contract() {
    assert!(PLANNER_SYSTEM_PROMPT.contains("week_schedule"));
    assert!(PLANNER_SYSTEM_PROMPT.contains("sunday"));
  }

  #[test]
  fn test_build_plan_prompt_sections() {
    // Arrange
    let now = Utc::now();
    let profile = UserProfile {
      days_per_week: 4,
      goal: "hypertrophy".to_string(),
      ..UserProfile::default()
    };
    let names = vec!["Back Squat".to_string(), "Barbell Row".to_string()];
    let missed = vec![MissedWorkout {
      scheduled_for: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
      title: "Lower A".to_string(),
    }];
    let coverage = CoverageAnalysisResult::compute(None, &[], now);
    let recovery = RecoveryReport::compute(&[], None, now);

    // Act
    let prompt = build_plan_prompt(&PromptContext {
      profile: &profile,
      duration_target_min: Some(45),
      exercise_names: &names,
      missed_workouts: &missed,
      coverage: &coverage,
      recovery: &recovery,
    });

    // Assert
    assert!(prompt.contains("Goal: hypertrophy"));
    assert!(prompt.contains("Session duration target: 45 minutes"));
    assert!(prompt.contains("- Barbell Row"));
    assert!(prompt.contains("- Lower A (2026-03-02)"));
    assert!(prompt.contains("MOVEMENT PATTERN COVERAGE"));
    assert!(prompt.contains(r#"{"week_schedule": {"monday""#));
    assert!(prompt.contains("Use exactly 4 training days."));
  }
}
