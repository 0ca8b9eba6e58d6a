use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// ---------------------------------------------------------------------------
/// Canonical Week
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
  Monday,
  Tuesday,
  Wednesday,
  Thursday,
  Friday,
  Saturday,
  Sunday,
}

impl Day {
  /// The seven schedule keys in canonical order
  pub const ALL: [Day; 7] = [
    Day::Monday,
    Day::Tuesday,
    Day::Wednesday,
    Day::Thursday,
    Day::Friday,
    Day::Saturday,
    Day::Sunday,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Day::Monday => "monday",
      Day::Tuesday => "tuesday",
      Day::Wednesday => "wednesday",
      Day::Thursday => "thursday",
      Day::Friday => "friday",
      Day::Saturday => "saturday",
      Day::Sunday => "sunday",
    }
  }

  /// Case-insensitive lookup of a day key ("Monday", "MONDAY", "monday")
  pub fn from_key(key: &str) -> Option<Self> {
    let key = key.trim().to_lowercase();
    Day::ALL.into_iter().find(|d| d.as_str() == key)
  }

  pub fn weekday(&self) -> chrono::Weekday {
    match self {
      Day::Monday => chrono::Weekday::Mon,
      Day::Tuesday => chrono::Weekday::Tue,
      Day::Wednesday => chrono::Weekday::Wed,
      Day::Thursday => chrono::Weekday::Thu,
      Day::Friday => chrono::Weekday::Fri,
      Day::Saturday => chrono::Weekday::Sat,
      Day::Sunday => chrono::Weekday::Sun,
    }
  }
}

impl std::fmt::Display for Day {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// ---------------------------------------------------------------------------
/// Movement Pattern / Tier
/// ---------------------------------------------------------------------------

/// Functional category of an exercise's primary action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MovementPattern {
  Squat,
  Hinge,
  Lunge,
  PushVert,
  PushHoriz,
  PullVert,
  PullHoriz,
  Carry,
  #[default]
  Unknown,
}

impl MovementPattern {
  /// The eight tracked patterns (everything except `Unknown`)
  pub const TRACKED: [MovementPattern; 8] = [
    MovementPattern::Squat,
    MovementPattern::Hinge,
    MovementPattern::Lunge,
    MovementPattern::PushVert,
    MovementPattern::PushHoriz,
    MovementPattern::PullVert,
    MovementPattern::PullHoriz,
    MovementPattern::Carry,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      MovementPattern::Squat => "squat",
      MovementPattern::Hinge => "hinge",
      MovementPattern::Lunge => "lunge",
      MovementPattern::PushVert => "push_vert",
      MovementPattern::PushHoriz => "push_horiz",
      MovementPattern::PullVert => "pull_vert",
      MovementPattern::PullHoriz => "pull_horiz",
      MovementPattern::Carry => "carry",
      MovementPattern::Unknown => "unknown",
    }
  }
}

impl std::fmt::Display for MovementPattern {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Compression priority: compound lifts are protected longest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
  /// Tier 1
  Compound,
  /// Tier 2
  #[default]
  Accessory,
  /// Tier 3: prehab, mobility, core
  Prehab,
}

/// ---------------------------------------------------------------------------
/// Rep Targets
/// ---------------------------------------------------------------------------

/// Rep prescription as it arrives from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepTarget {
  Count(u32),
  /// Hyphenated range such as "8-12", min < max
  Range { min: u32, max: u32 },
  /// Timed-duration equivalent such as "30s" or "45 seconds"
  Seconds(u32),
}

impl RepTarget {
  /// Parse the string forms: "10", "8-12", "30s", "45 sec", "60 seconds".
  /// En and em dashes separate ranges too, and a trailing "reps" is ignored.
  pub fn parse(raw: &str) -> Option<Self> {
    let lowered = raw.trim().to_lowercase().replace(['\u{2013}', '\u{2014}'], "-");
    let text = lowered
      .strip_suffix("reps")
      .or_else(|| lowered.strip_suffix("rep"))
      .unwrap_or(&lowered)
      .trim();
    if text.is_empty() {
      return None;
    }

    if let Ok(n) = text.parse::<u32>() {
      return (n > 0).then_some(RepTarget::Count(n));
    }

    if let Some((lo, hi)) = text.split_once('-') {
      let min = lo.trim().parse::<u32>().ok()?;
      let max = hi.trim().parse::<u32>().ok()?;
      return (min > 0 && min < max).then_some(RepTarget::Range { min, max });
    }

    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    let unit = text[digits.len()..].trim();
    if !digits.is_empty() && matches!(unit, "s" | "sec" | "secs" | "second" | "seconds") {
      let n = digits.parse::<u32>().ok()?;
      return (n > 0).then_some(RepTarget::Seconds(n));
    }

    None
  }

  /// Rep count used for volume resolution (lower bound for ranges)
  pub fn rep_count(&self) -> Option<u32> {
    match self {
      RepTarget::Count(n) => Some(*n),
      RepTarget::Range { min, .. } => Some(*min),
      RepTarget::Seconds(_) => None,
    }
  }

  pub fn seconds(&self) -> Option<u32> {
    match self {
      RepTarget::Seconds(s) => Some(*s),
      _ => None,
    }
  }
}

impl std::fmt::Display for RepTarget {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      RepTarget::Count(n) => write!(f, "{}", n),
      RepTarget::Range { min, max } => write!(f, "{}-{}", min, max),
      RepTarget::Seconds(s) => write!(f, "{}s", s),
    }
  }
}

impl Serialize for RepTarget {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    match self {
      RepTarget::Count(n) => serializer.serialize_u32(*n),
      other => serializer.serialize_str(&other.to_string()),
    }
  }
}

impl<'de> Deserialize<'de> for RepTarget {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      Number(u32),
      Text(String),
    }

    match Raw::deserialize(deserializer)? {
      Raw::Number(n) if n > 0 => Ok(RepTarget::Count(n)),
      Raw::Number(n) => Err(serde::de::Error::custom(format!("rep target must be positive, got {}", n))),
      Raw::Text(s) => RepTarget::parse(&s)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid rep target: {}", s))),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Sets and Slots
/// ---------------------------------------------------------------------------

/// What a single set asks for: reps or a hold/interval duration, never both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetTarget {
  Reps(u32),
  DurationSec(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSpec {
  pub index: u32,
  #[serde(flatten)]
  pub target: SetTarget,
  pub weight: Option<f64>,
  pub rest_time_sec: u32,
}

/// Slot fields the normalizer filled in because the model omitted them or
/// sent something unusable. Volume resolution swaps these for category
/// defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairedFields {
  pub sets: bool,
  pub reps: bool,
  pub rest: bool,
}

impl RepairedFields {
  pub fn any(&self) -> bool {
    self.sets || self.reps || self.rest
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSlot {
  pub name: String,
  pub target_sets: u32,
  pub target_reps: RepTarget,
  pub rest_time_sec: u32,
  #[serde(default)]
  pub movement_pattern: MovementPattern,
  /// Inferred at runtime, never persisted
  #[serde(skip)]
  pub tier: Tier,
  #[serde(default)]
  pub is_timed: bool,
  #[serde(default)]
  pub sets: Vec<SetSpec>,
  #[serde(skip)]
  pub repaired: RepairedFields,
}

impl ExerciseSlot {
  pub fn new(name: &str, target_sets: u32, target_reps: RepTarget) -> Self {
    Self {
      name: name.to_string(),
      target_sets,
      target_reps,
      rest_time_sec: 60,
      movement_pattern: MovementPattern::Unknown,
      tier: Tier::Accessory,
      is_timed: matches!(target_reps, RepTarget::Seconds(_)),
      sets: Vec::new(),
      repaired: RepairedFields::default(),
    }
  }

  /// Rebuild `sets` from the slot-level prescription
  pub fn expand_sets(&mut self, duration_sec: Option<u32>, weight: Option<f64>) {
    let target = match (self.is_timed, duration_sec, self.target_reps.rep_count()) {
      (true, Some(secs), _) => SetTarget::DurationSec(secs),
      (true, None, _) => SetTarget::DurationSec(self.target_reps.seconds().unwrap_or(30)),
      (false, _, Some(reps)) => SetTarget::Reps(reps),
      (false, _, None) => SetTarget::Reps(1),
    };

    self.sets = (0..self.target_sets)
      .map(|index| SetSpec {
        index,
        target,
        weight,
        rest_time_sec: self.rest_time_sec,
      })
      .collect();
  }

  /// Drop trailing sets so that `target_sets` and `sets` agree on `count`
  pub fn truncate_sets(&mut self, count: u32) {
    self.target_sets = count;
    self.sets.truncate(count as usize);
  }
}

/// ---------------------------------------------------------------------------
/// Week Schedule
/// ---------------------------------------------------------------------------

/// All seven canonical days, each with an ordered exercise list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Day, Vec<ExerciseSlot>>", into = "BTreeMap<Day, Vec<ExerciseSlot>>")]
pub struct WeekSchedule {
  days: BTreeMap<Day, Vec<ExerciseSlot>>,
}

impl Default for WeekSchedule {
  fn default() -> Self {
    Self {
      days: Day::ALL.into_iter().map(|d| (d, Vec::new())).collect(),
    }
  }
}

impl From<BTreeMap<Day, Vec<ExerciseSlot>>> for WeekSchedule {
  fn from(mut days: BTreeMap<Day, Vec<ExerciseSlot>>) -> Self {
    for day in Day::ALL {
      days.entry(day).or_default();
    }
    Self { days }
  }
}

impl From<WeekSchedule> for BTreeMap<Day, Vec<ExerciseSlot>> {
  fn from(schedule: WeekSchedule) -> Self {
    schedule.days
  }
}

impl WeekSchedule {
  pub fn day(&self, day: Day) -> &[ExerciseSlot] {
    self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn day_mut(&mut self, day: Day) -> &mut Vec<ExerciseSlot> {
    self.days.entry(day).or_default()
  }

  pub fn set_day(&mut self, day: Day, exercises: Vec<ExerciseSlot>) {
    self.days.insert(day, exercises);
  }

  /// Days in canonical order
  pub fn iter(&self) -> impl Iterator<Item = (Day, &[ExerciseSlot])> {
    self.days.iter().map(|(d, e)| (*d, e.as_slice()))
  }

  pub fn exercises_mut(&mut self) -> impl Iterator<Item = &mut ExerciseSlot> {
    self.days.values_mut().flat_map(|e| e.iter_mut())
  }

  /// Days containing at least one exercise, canonical order
  pub fn active_days(&self) -> Vec<Day> {
    self.iter().filter(|(_, e)| !e.is_empty()).map(|(d, _)| d).collect()
  }

  pub fn exercise_count(&self) -> usize {
    self.days.values().map(Vec::len).sum()
  }
}
