//! End-to-end plan generation against a scripted generator and a file-backed store

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Mutex;

use trainer_planner::{
  initialize_db, Day, LlmError, ModelCache, MovementPattern, PlanGenerator, PlanPipeline, PlanRequest, SetTarget,
  TrainingStore, UserProfile,
};

const RAW_PLAN: &str = r#"Sure! Here's a balanced week.

```json
{
  "weekSchedule": {
    "Monday": [
      {"name": "Back Squat", "targetSets": "4", "targetReps": "4-6", "restTimeSec": 180},
      {"name": "Bench Press", "target_sets": 4, "target_reps": 6, "rest_time_sec": 150},
      {"name": "Plank", "target_sets": 3, "target_reps": 12}
    ],
    "wednesday": [
      {"name": "Romanian Deadlift", "target_sets": 4, "target_reps": 8},
      {"name": "Barbell Row", "target_sets": 4, "target_reps": 8, "rest_time_sec": -5},
      {"name": "", "target_sets": 3, "target_reps": 10}
    ],
    "friday": [
      {"name": "Front Squat", "target_sets": 3, "target_reps": 5}
    ],
    "saturday": [
      {"name": "Farmer Carry", "target_sets": 3, "target_reps": "40s"}
    ]
  }
}
```

Let me know if you want changes."#;

struct CannedGenerator {
  replies: Mutex<Vec<Result<String, LlmError>>>,
}

impl CannedGenerator {
  fn new(mut replies: Vec<Result<String, LlmError>>) -> Self {
    replies.reverse();
    Self {
      replies: Mutex::new(replies),
    }
  }
}

#[async_trait]
impl PlanGenerator for CannedGenerator {
  async fn resolve_model(&self) -> Result<String, LlmError> {
    Ok("claude-sonnet-4-20250514".to_string())
  }

  async fn generate(&self, _model: &str, _system: &str, _prompt: &str) -> Result<String, LlmError> {
    self
      .replies
      .lock()
      .unwrap()
      .pop()
      .unwrap_or_else(|| Err(LlmError::Api("exhausted".to_string())))
  }
}

async fn seeded_store(tag: &str) -> TrainingStore {
  let path = std::env::temp_dir().join(format!("planner-it-{}-{}.db", tag, std::process::id()));
  let _ = std::fs::remove_file(&path);
  let pool = initialize_db(&path).await.unwrap();

  for (name, timed, duration) in [
    ("Back Squat", false, None),
    ("Bench Press", false, None),
    ("Plank", true, Some(45u32)),
    ("Farmer Carry", true, Some(40u32)),
  ] {
    sqlx::query("INSERT INTO exercise_catalog (name, is_timed, default_duration_sec) VALUES (?1, ?2, ?3)")
      .bind(name)
      .bind(timed)
      .bind(duration)
      .execute(&pool)
      .await
      .unwrap();
  }

  let now = Utc::now();
  for (name, hours_ago, weight, reps) in [
    ("Back Squat", 24, 100.0, 5),
    ("Bench Press", 72, 72.5, 6),
    ("Barbell Row", 400, 60.0, 8),
  ] {
    sqlx::query("INSERT INTO exercise_logs (exercise_name, performed_at, weight, reps) VALUES (?1, ?2, ?3, ?4)")
      .bind(name)
      .bind(now - Duration::hours(hours_ago))
      .bind(weight)
      .bind(reps)
      .execute(&pool)
      .await
      .unwrap();
  }

  TrainingStore::new(pool)
}

async fn request_from(store: &TrainingStore, profile: UserProfile) -> PlanRequest {
  let names = store.exercise_names().await.unwrap();
  PlanRequest {
    catalog_names: names.catalog,
    custom_names: names.custom,
    catalog: store.catalog().await.unwrap(),
    recent_logs: store.recent_logs(Utc::now() - Duration::days(21)).await.unwrap(),
    missed_workouts: store.missed_workouts(Utc::now().date_naive() - Duration::days(7)).await.unwrap(),
    ..PlanRequest::new(profile)
  }
}

#[tokio::test]
async fn test_end_to_end_plan_from_messy_output() {
  // Arrange
  let store = seeded_store("e2e").await;
  let profile = UserProfile {
    days_per_week: 3,
    ..UserProfile::default()
  };
  let request = request_from(&store, profile).await;
  let generator = CannedGenerator::new(vec![Ok(RAW_PLAN.to_string())]);
  let cache = ModelCache::default();

  // Act
  let outcome = PlanPipeline::new(&generator, &cache).run(&request).await.unwrap();

  // Assert: three training days, first three in week order
  assert_eq!(
    outcome.schedule.active_days(),
    vec![Day::Monday, Day::Wednesday, Day::Friday]
  );
  assert!(outcome.schedule.day(Day::Saturday).is_empty());

  let monday = outcome.schedule.day(Day::Monday);
  assert_eq!(monday[0].movement_pattern, MovementPattern::Squat);
  assert_eq!(monday[0].sets.len(), 4);
  assert_eq!(monday[0].sets[0].target, SetTarget::Reps(4));
  assert_eq!(monday[0].sets[0].weight, Some(100.0));
  assert_eq!(monday[1].sets[0].weight, Some(72.5));
  assert!(monday[2].sets.iter().all(|s| s.target == SetTarget::DurationSec(45)));

  // Nameless exercise dropped; missing and bad rests take the category default
  let wednesday = outcome.schedule.day(Day::Wednesday);
  assert_eq!(wednesday.len(), 2);
  assert_eq!(wednesday[0].rest_time_sec, 180);
  assert_eq!(wednesday[1].rest_time_sec, 150);
  assert!(outcome.warnings.len() >= 2);

  // Squat logged heavy 24h ago, scheduled again Monday or Friday
  assert!(!outcome.recovery.states[&MovementPattern::Squat].recovered);
  assert!(!outcome.recovery.is_schedulable("Goblet Squat"));
  assert!(outcome.compression.is_empty());
  assert_eq!(cache.get().as_deref(), Some("claude-sonnet-4-20250514"));

  store.pool().close().await;
}

#[tokio::test]
async fn test_outage_is_retryable_and_clears_model() {
  let store = seeded_store("outage").await;
  let request = request_from(&store, UserProfile::default()).await;
  let generator = CannedGenerator::new(vec![
    Err(LlmError::ServiceUnavailable("overloaded".to_string())),
    Ok(RAW_PLAN.to_string()),
  ]);
  let cache = ModelCache::default();
  let pipeline = PlanPipeline::new(&generator, &cache);

  let err = pipeline.run(&request).await.unwrap_err();
  assert!(err.is_retryable());
  assert!(cache.get().is_none());

  let outcome = pipeline.run(&request).await.unwrap();
  assert_eq!(outcome.schedule.iter().count(), 7);

  store.pool().close().await;
}
